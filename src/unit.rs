/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core data types for scheduled units.
//!
//! A *scheduled unit* is one admitted piece of work: an execution context on
//! the underlying kernel plus the bookkeeping record the scheduler orders by
//! deadline.  The record type here is deliberately link-free: list membership
//! lives in the [`UnitArena`](crate::arena::UnitArena) slot table, so a record
//! can belong to at most one list by construction.
//!
//! # Ownership model
//! A producer builds a [`UnitRecord`] after creating the unit's (suspended)
//! execution context, then **moves** it into the scheduler through the
//! `Create` command.  From that point on the scheduling actor is the only
//! owner; the record leaves the system again when the actor releases its
//! arena slot.

use std::fmt;

/// Monotonic time value in milliseconds since scheduler start.
pub type Tick = u64;

// ── Identity ──────────────────────────────────────────────────────────────────

/// Stable numeric identifier of a workload source.
///
/// Every instance released by the same producer carries the same `UnitId`;
/// the acknowledgment channel for the create/delete handshake is looked up by
/// this value, never by parsing the display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle of an execution context on the underlying kernel.
///
/// Assigned by the kernel seam when the context is created; the scheduler
/// treats it as an identity token and never inspects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelHandle(pub u64);

impl fmt::Display for KernelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Category ──────────────────────────────────────────────────────────────────

/// Workload category of a scheduled unit.
///
/// `Aperiodic` units are ordered at the tail of the active list regardless of
/// their deadline; `Periodic` and `Untyped` units take part in normal
/// earliest-deadline-first ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitCategory {
    Periodic,
    Aperiodic,
    /// Category not yet assigned.  Scheduled like `Periodic`.
    #[default]
    Untyped,
}

// ── UnitRecord ────────────────────────────────────────────────────────────────

/// Bookkeeping record for one admitted unit of work.
///
/// The execution context behind `handle` must already exist (suspended) when
/// the record is built; a record for a context that does not exist yet is
/// unrepresentable.
#[derive(Debug, Clone)]
pub struct UnitRecord {
    /// Stable identifier of the producing workload source.
    pub id: UnitId,
    /// Human-readable name, used only for rendered snapshots and logs.
    pub name: String,
    pub category: UnitCategory,
    /// Tick at which this instance was released by its producer.
    pub start: Tick,
    /// Absolute deadline of this instance.
    pub deadline: Tick,
    /// Execution context this record is bookkeeping for.
    pub handle: KernelHandle,
}

impl UnitRecord {
    pub fn is_aperiodic(&self) -> bool {
        self.category == UnitCategory::Aperiodic
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
