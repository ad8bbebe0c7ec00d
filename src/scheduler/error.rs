/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the scheduling actor and its handshake
//! protocol.
//!
//! [`AdmissionError`] travels through the acknowledgment channel back to the
//! producer, so it is `Clone` and carries the exact numbers a caller needs to
//! log the rejection without further digging.

use thiserror::Error;

// ── Admission ─────────────────────────────────────────────────────────────────

/// Why a unit was refused entry to the active list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// Every priority band below the reserved ceiling is already occupied.
    ///
    /// The unit never joined the scheduler and must not be allowed to run;
    /// the producer surfaces this as a rejected admission, never as success.
    #[error("priority bands exhausted: {active} unit(s) active, capacity {capacity}")]
    BandsExhausted { active: u32, capacity: u32 },
}

// ── Handshake ─────────────────────────────────────────────────────────────────

/// Failure of a producer-side handshake or query round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// The scheduler refused the admission; the unit must not be resumed.
    #[error(transparent)]
    Rejected(#[from] AdmissionError),

    /// The scheduling actor has stopped (run horizon reached or every
    /// command sender dropped).  Callers treat this as shutdown, not as a
    /// retryable condition.
    #[error("scheduler is no longer running")]
    SchedulerGone,
}

// ── Actor exit ────────────────────────────────────────────────────────────────

/// Why the scheduling actor's command loop returned.
///
/// Both variants are controlled shutdown outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerExit {
    /// The configured run horizon was passed.
    HorizonReached,
    /// Every command sender was dropped; no further work can arrive.
    Disconnected,
}

impl std::fmt::Display for SchedulerExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerExit::HorizonReached => write!(f, "run horizon reached"),
            SchedulerExit::Disconnected => write!(f, "command queue disconnected"),
        }
    }
}
