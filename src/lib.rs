/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! ddsched – deadline-driven scheduling bridge
//!
//! Maps earliest-deadline-first order onto the fixed priority bands of a
//! preemptive kernel: a single scheduling actor owns a deadline-ordered
//! active list plus a bounded overdue store, and re-derives every unit's
//! kernel priority from its list position after each mutation.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── config/     – YAML scheduler/workload configuration
//! ├── unit.rs     – scheduled-unit records and identifiers
//! ├── bands.rs    – pure priority-band derivation
//! ├── arena.rs    – generation-checked slot storage
//! ├── list.rs     – deadline-ordered list engine
//! ├── scheduler/  – the scheduling actor + handshake/query endpoints
//! ├── kernel.rs   – fixed-priority kernel seam (+ in-process simulation)
//! ├── workload.rs – demo periodic/aperiodic producers
//! └── monitor.rs  – recurring report loop
//! ```

pub mod arena;
pub mod bands;
pub mod config;
pub mod kernel;
pub mod list;
pub mod monitor;
pub mod scheduler;
pub mod unit;
pub mod workload;
