//! The scheduling actor.
//!
//! [`Scheduler`] is the single scheduling authority: it exclusively owns the
//! active list, the overdue store and the arena behind them, and consumes a
//! bounded command queue.  One command is handled to completion at a time —
//! the actor has a single *Idle* state and never re-enters itself, which is
//! what gives the lists their exclusivity guarantee without any locks.
//!
//! On every command, before dispatching it, the actor
//! 1. drains units whose deadline has passed into the overdue store
//!    (suspending and destroying their execution contexts), and
//! 2. trims the overdue store to its retention cap,
//!
//! so deadline-miss detection latency is bounded by inter-command gaps and a
//! query can never observe more than the cap.
//!
//! # Command protocol
//! In-process message passing only (see [`Command`]).  Producers talk to the
//! actor through the handshake endpoints in [`client`]; the recurring
//! monitor uses the query endpoints from the same module.
//!
//! # Shutdown
//! An optional run horizon turns the actor into a bounded bench: once the
//! current tick passes it, the loop returns
//! [`SchedulerExit::HorizonReached`] and every endpoint observes the
//! shutdown as [`error::HandshakeError::SchedulerGone`].

pub mod client;
pub mod error;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::arena::UnitArena;
use crate::bands::PriorityBands;
use crate::config::SchedulerSettings;
use crate::kernel::Kernel;
use crate::list::DeadlineList;
use crate::unit::{KernelHandle, Tick, UnitId, UnitRecord};

use client::{AckSignal, Endpoints};
use error::{AdmissionError, SchedulerExit};

// ── Command protocol ──────────────────────────────────────────────────────────

/// Which of the two scheduler lists a snapshot was rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Active,
    Overdue,
}

/// Point-in-time rendering of one scheduler list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot {
    pub source: ListKind,
    /// Tick at which the owning command was serviced.
    pub tick: Tick,
    /// Rendered text, one line per record (`Nothing in list.` when empty).
    pub rendered: String,
}

/// Message accepted by the scheduling actor.
#[derive(Debug)]
pub enum Command {
    /// Admit a new unit to the active list.  The record identifies the
    /// issuing producer through its `id`; the acknowledgment goes back on
    /// that producer's channel.
    Create(UnitRecord),
    /// Retire the unit owning `handle` from the active list.  `id` routes
    /// the acknowledgment; it is carried explicitly so routing never
    /// depends on the state of the record being deleted.
    Delete { handle: KernelHandle, id: UnitId },
    QueryActive,
    QueryOverdue,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// The scheduling actor.  See the module docs for the protocol.
pub struct Scheduler<K: Kernel> {
    kernel: Arc<K>,
    bands: PriorityBands,
    retention: u32,
    horizon: Option<Tick>,
    arena: UnitArena,
    active: DeadlineList,
    overdue: DeadlineList,
    commands: mpsc::Receiver<Command>,
    acks: HashMap<UnitId, watch::Sender<AckSignal>>,
    replies: watch::Sender<Option<ListSnapshot>>,
}

impl<K: Kernel> Scheduler<K> {
    /// Build the actor and the connected endpoint set.
    ///
    /// `unit_ids` is the fixed set of workload sources; each gets a
    /// dedicated single-slot acknowledgment channel keyed by its id.
    pub fn new(
        kernel: Arc<K>,
        settings: &SchedulerSettings,
        unit_ids: impl IntoIterator<Item = UnitId>,
    ) -> (Self, Endpoints) {
        let (command_tx, command_rx) = mpsc::channel(settings.command_queue_depth);
        let (reply_tx, reply_rx) = watch::channel(None);

        let mut ack_senders = HashMap::new();
        let mut ack_receivers = HashMap::new();
        for id in unit_ids {
            let (tx, rx) = watch::channel(None);
            ack_senders.insert(id, tx);
            ack_receivers.insert(id, rx);
        }

        let scheduler = Self {
            kernel,
            bands: settings.bands,
            retention: settings.overdue_retention,
            horizon: settings.run_horizon,
            arena: UnitArena::new(),
            active: DeadlineList::new(),
            overdue: DeadlineList::new(),
            commands: command_rx,
            acks: ack_senders,
            replies: reply_tx,
        };
        let endpoints = Endpoints::new(command_tx, ack_receivers, reply_rx);
        (scheduler, endpoints)
    }

    /// Command loop.  Returns only on a controlled shutdown.
    pub async fn run(mut self) -> SchedulerExit {
        info!(
            capacity = self.bands.capacity(),
            retention = self.retention,
            horizon = ?self.horizon,
            "scheduling actor running"
        );
        loop {
            let Some(command) = self.commands.recv().await else {
                info!("all command senders dropped; scheduling actor stopping");
                return SchedulerExit::Disconnected;
            };

            let now = self.kernel.now();
            self.expire(now);
            self.trim_overdue();

            if let Some(horizon) = self.horizon {
                if now > horizon {
                    info!(tick = now, horizon, "run horizon passed; scheduling actor stopping");
                    return SchedulerExit::HorizonReached;
                }
            }

            match command {
                Command::Create(record) => self.handle_create(record),
                Command::Delete { handle, id } => self.handle_delete(handle, id),
                Command::QueryActive => self.publish(ListKind::Active, now),
                Command::QueryOverdue => self.publish(ListKind::Overdue, now),
            }
        }
    }

    // ── Command handlers ──────────────────────────────────────────────────────

    fn handle_create(&mut self, record: UnitRecord) {
        let id = record.id;
        let handle = record.handle;
        let deadline = record.deadline;

        let slot = self.arena.admit(record);
        let outcome = self.active.insert_edf(&mut self.arena, slot, &self.bands);
        match outcome {
            Ok(()) => {
                self.sync_bands();
                debug!(
                    unit = %id,
                    %handle,
                    deadline,
                    active = self.active.len(),
                    "unit admitted"
                );
            }
            Err(err) => {
                warn!(unit = %id, %handle, %err, "admission refused");
                let _ = self.arena.release(slot);
            }
        }
        self.acknowledge(id, outcome);
    }

    fn handle_delete(&mut self, handle: KernelHandle, id: UnitId) {
        match self.active.remove_by_handle(&mut self.arena, handle) {
            Some(slot) => {
                let _ = self.arena.release(slot);
                self.sync_bands();
                debug!(unit = %id, %handle, active = self.active.len(), "unit retired");
            }
            None => {
                // Already expired into the overdue store, or never admitted.
                warn!(unit = %id, %handle, "delete for a handle not on the active list");
            }
        }
        // Acknowledge unconditionally; the issuing context is blocked on it.
        self.acknowledge(id, Ok(()));
    }

    fn publish(&self, kind: ListKind, now: Tick) {
        let rendered = match kind {
            ListKind::Active => self.active.render(&self.arena),
            ListKind::Overdue => self.overdue.render(&self.arena),
        };
        // The reply channel is a single slot: sending overwrites any unread
        // snapshot, so the latest query always wins.
        let snapshot = ListSnapshot {
            source: kind,
            tick: now,
            rendered,
        };
        if self.replies.send(Some(snapshot)).is_err() {
            debug!("query reply dropped; no reporter endpoints remain");
        }
    }

    // ── Bookkeeping ───────────────────────────────────────────────────────────

    /// Move every expired unit into the overdue store and stop its context.
    fn expire(&mut self, now: Tick) {
        let due = self.active.drain_overdue(&mut self.arena, now);
        if due.is_empty() {
            return;
        }
        for slot in due {
            let (name, handle, deadline) = {
                let rec = &self.arena[slot].record;
                (rec.name.clone(), rec.handle, rec.deadline)
            };
            self.kernel.suspend(handle);
            self.kernel.destroy(handle);
            self.overdue.push_back(&mut self.arena, slot);
            warn!(
                unit = %name,
                %handle,
                deadline,
                tick = now,
                "deadline missed; unit moved to the overdue store"
            );
        }
        self.sync_bands();
    }

    /// Drop the oldest overdue records until the store fits the cap.
    fn trim_overdue(&mut self) {
        while self.overdue.len() > self.retention {
            let Some(slot) = self.overdue.pop_front(&mut self.arena) else {
                break;
            };
            if let Some(rec) = self.arena.release(slot) {
                debug!(unit = %rec.id, "retention cap reached; oldest overdue record dropped");
            }
        }
    }

    /// Push a full priority recomputation through the kernel: the head of
    /// the active list gets the highest derived band, the tail the floor.
    /// Reassignment is total; a partially updated list is never visible.
    fn sync_bands(&self) {
        let len = self.active.len();
        for (position, node) in self.active.iter(&self.arena).enumerate() {
            let band = self.bands.band_at(position as u32, len);
            self.kernel.set_priority(node.record.handle, band);
        }
    }

    fn acknowledge(&self, id: UnitId, outcome: Result<(), AdmissionError>) {
        match self.acks.get(&id) {
            Some(tx) => {
                if tx.send(Some(outcome)).is_err() {
                    debug!(unit = %id, "acknowledgment dropped; producer endpoint is gone");
                }
            }
            None => warn!(unit = %id, "no acknowledgment channel for unit id"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
