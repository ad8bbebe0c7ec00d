/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Producer and monitor endpoints of the scheduling actor.
//!
//! # Lifecycle handshake
//! A producer must not let a unit run before the scheduler's bookkeeping
//! knows about it, and must not tear a context down while the scheduler
//! still references it.  Both directions use the same two-phase exchange:
//! send a command, then block on the acknowledgment channel dedicated to the
//! unit's stable id.
//!
//! * **Create**: build the record, create the execution context *suspended*,
//!   [`UnitGate::register`] it, and only resume the context on an `Ok`.
//! * **Delete**: from inside the unit's own context, [`UnitGate::retire`]
//!   the handle and destroy the context only after the acknowledgment.
//!
//! Acknowledgment channels are `tokio::sync::watch`: a single slot where a
//! send overwrites any unread value.  At most one handshake per unit id is
//! in flight at a time, so the newest acknowledgment is always the one the
//! blocked caller is waiting for.  Every wait is unbounded; a handshake is
//! not cancellable once begun.
//!
//! # Query protocol
//! All queriers share one single-slot reply channel with the same overwrite
//! semantics: the latest query wins, a stale unread snapshot is discarded.

use std::collections::HashMap;

use tokio::sync::{mpsc, watch};

use crate::scheduler::error::{AdmissionError, HandshakeError};
use crate::scheduler::{Command, ListSnapshot};
use crate::unit::{KernelHandle, UnitId, UnitRecord};

/// Value carried by an acknowledgment channel.  `None` until the first
/// handshake on the channel completes.
pub type AckSignal = Option<Result<(), AdmissionError>>;

// ── Endpoints ─────────────────────────────────────────────────────────────────

/// Connected endpoint set produced alongside the actor.
///
/// Holds one acknowledgment receiver per configured unit id plus the shared
/// query reply receiver.  Producers take a [`UnitGate`] for their id; the
/// monitor takes a [`Reporter`].
pub struct Endpoints {
    pub(crate) commands: mpsc::Sender<Command>,
    pub(crate) acks: HashMap<UnitId, watch::Receiver<AckSignal>>,
    pub(crate) replies: watch::Receiver<Option<ListSnapshot>>,
}

impl Endpoints {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        acks: HashMap<UnitId, watch::Receiver<AckSignal>>,
        replies: watch::Receiver<Option<ListSnapshot>>,
    ) -> Self {
        Self {
            commands,
            acks,
            replies,
        }
    }

    /// Handshake endpoint for the workload source `id`, or `None` if the id
    /// was not part of the configured set.
    pub fn gate(&self, id: UnitId) -> Option<UnitGate> {
        let ack = self.acks.get(&id)?.clone();
        Some(UnitGate {
            id,
            commands: self.commands.clone(),
            ack,
        })
    }

    /// Query endpoint for a monitor.
    pub fn reporter(&self) -> Reporter {
        Reporter {
            commands: self.commands.clone(),
            replies: self.replies.clone(),
        }
    }
}

// ── UnitGate ──────────────────────────────────────────────────────────────────

/// Producer-side handshake endpoint for one workload source.
#[derive(Debug, Clone)]
pub struct UnitGate {
    id: UnitId,
    commands: mpsc::Sender<Command>,
    ack: watch::Receiver<AckSignal>,
}

impl UnitGate {
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Register a freshly created (still suspended) unit with the scheduler
    /// and block until it has been placed in the ordered bookkeeping.
    ///
    /// On `Ok` the caller may resume the unit's execution context.  On
    /// [`HandshakeError::Rejected`] the unit never joined the scheduler and
    /// must not run.
    pub async fn register(&mut self, record: UnitRecord) -> Result<(), HandshakeError> {
        debug_assert_eq!(record.id, self.id, "record registered through the wrong gate");
        // Mark anything already in the slot as seen, so the wait below only
        // completes on the acknowledgment for this command.
        self.ack.borrow_and_update();
        self.commands
            .send(Command::Create(record))
            .await
            .map_err(|_| HandshakeError::SchedulerGone)?;
        self.await_ack().await
    }

    /// Retire the unit owning `handle` and block until the scheduler has
    /// dropped its bookkeeping.  Only after this returns may the calling
    /// context be destroyed.
    pub async fn retire(&mut self, handle: KernelHandle) -> Result<(), HandshakeError> {
        self.ack.borrow_and_update();
        self.commands
            .send(Command::Delete {
                handle,
                id: self.id,
            })
            .await
            .map_err(|_| HandshakeError::SchedulerGone)?;
        self.await_ack().await
    }

    async fn await_ack(&mut self) -> Result<(), HandshakeError> {
        loop {
            self.ack
                .changed()
                .await
                .map_err(|_| HandshakeError::SchedulerGone)?;
            if let Some(outcome) = self.ack.borrow_and_update().clone() {
                return outcome.map_err(HandshakeError::from);
            }
        }
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

/// Monitor-side query endpoint.
#[derive(Debug, Clone)]
pub struct Reporter {
    commands: mpsc::Sender<Command>,
    replies: watch::Receiver<Option<ListSnapshot>>,
}

impl Reporter {
    /// Snapshot of the active list.
    pub async fn active(&mut self) -> Result<ListSnapshot, HandshakeError> {
        self.query(Command::QueryActive).await
    }

    /// Snapshot of the overdue store.
    pub async fn overdue(&mut self) -> Result<ListSnapshot, HandshakeError> {
        self.query(Command::QueryOverdue).await
    }

    async fn query(&mut self, command: Command) -> Result<ListSnapshot, HandshakeError> {
        self.replies.borrow_and_update();
        self.commands
            .send(command)
            .await
            .map_err(|_| HandshakeError::SchedulerGone)?;
        loop {
            self.replies
                .changed()
                .await
                .map_err(|_| HandshakeError::SchedulerGone)?;
            if let Some(snapshot) = self.replies.borrow_and_update().clone() {
                return Ok(snapshot);
            }
        }
    }
}
