/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Deadline-ordered list engine.
//!
//! [`DeadlineList`] is a doubly-linked sequence threaded through the
//! [`UnitArena`]; the same structure serves both scheduler lists:
//!
//! * **Active list** — kept in earliest-deadline-first order via
//!   [`insert_edf`](DeadlineList::insert_edf).  Aperiodic units always sit at
//!   the tail regardless of their deadline; a unit with the same
//!   `(start, deadline)` pair as a neighbour orders by ascending [`UnitId`].
//! * **Overdue store** — plain FIFO via [`push_back`](DeadlineList::push_back)
//!   and [`pop_front`](DeadlineList::pop_front), bounded by the retention cap.
//!
//! All operations that detach a node return its [`SlotId`] to the caller:
//! ownership of the slot passes out of the list, and the caller decides
//! whether to release it back to the arena or re-link it elsewhere.  The
//! list never frees records itself.
//!
//! Kernel priorities are *not* stored here.  They are a pure function of
//! list position (see [`crate::bands`]) and the scheduling actor pushes a
//! full recomputation through the kernel seam after every mutation.

use std::fmt::Write as _;

use crate::arena::{Node, SlotId, UnitArena};
use crate::bands::PriorityBands;
use crate::scheduler::error::AdmissionError;
use crate::unit::{KernelHandle, Tick, UnitCategory};

/// A doubly-linked sequence of arena slots plus its length.
///
/// `len` always equals the number of nodes reachable walking head→tail; the
/// mutation operations keep the two in lock-step.
#[derive(Debug, Default)]
pub struct DeadlineList {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: u32,
}

impl DeadlineList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // ── Active-list ordering ──────────────────────────────────────────────────

    /// Insert `slot` at its earliest-deadline-first position.
    ///
    /// Refused with [`AdmissionError::BandsExhausted`] when the grown list
    /// would not fit under the priority ceiling; the list is left untouched
    /// and the caller must surface the rejection.
    pub fn insert_edf(
        &mut self,
        arena: &mut UnitArena,
        slot: SlotId,
        bands: &PriorityBands,
    ) -> Result<(), AdmissionError> {
        bands.check_insert(self.len + 1)?;
        debug_assert!(arena[slot].is_unlinked(), "insert of an already-linked slot");

        let (start, deadline, id, category) = {
            let rec = &arena[slot].record;
            (rec.start, rec.deadline, rec.id, rec.category)
        };

        // Aperiodic units always resolve to the tail.
        let before = if category == UnitCategory::Aperiodic {
            None
        } else {
            let mut found = None;
            let mut cursor = self.head;
            while let Some(cur) = cursor {
                let rec = &arena[cur].record;
                let earlier_tie =
                    start == rec.start && deadline == rec.deadline && id < rec.id;
                if deadline < rec.deadline
                    || rec.category == UnitCategory::Aperiodic
                    || earlier_tie
                {
                    found = Some(cur);
                    break;
                }
                cursor = arena[cur].next;
            }
            found
        };

        match before {
            Some(cur) => self.link_before(arena, slot, cur),
            None => self.push_back(arena, slot),
        }
        Ok(())
    }

    /// Append `slot` at the tail (FIFO discipline of the overdue store).
    pub fn push_back(&mut self, arena: &mut UnitArena, slot: SlotId) {
        debug_assert!(arena[slot].is_unlinked(), "push_back of an already-linked slot");
        match self.tail {
            Some(tail) => {
                arena[tail].next = Some(slot);
                arena[slot].prev = Some(tail);
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
    }

    fn link_before(&mut self, arena: &mut UnitArena, slot: SlotId, before: SlotId) {
        let prev = arena[before].prev;
        {
            let node = &mut arena[slot];
            node.prev = prev;
            node.next = Some(before);
        }
        arena[before].prev = Some(slot);
        match prev {
            Some(prev) => arena[prev].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.len += 1;
    }

    // ── Removal ───────────────────────────────────────────────────────────────

    /// Detach `slot` from the list, clearing its links.  Ownership of the
    /// slot passes back to the caller.
    pub fn unlink(&mut self, arena: &mut UnitArena, slot: SlotId) {
        let (prev, next) = {
            let node = &arena[slot];
            (node.prev, node.next)
        };
        match prev {
            Some(prev) => arena[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => arena[next].prev = prev,
            None => self.tail = prev,
        }
        {
            let node = &mut arena[slot];
            node.prev = None;
            node.next = None;
        }
        debug_assert!(self.len > 0, "unlink from an empty list");
        self.len -= 1;
    }

    /// Find and detach the record owned by `handle`.
    ///
    /// Sole, head, tail and interior positions are all handled by the link
    /// surgery in [`unlink`](Self::unlink).  Returns `None` when no linked
    /// record carries the handle.
    pub fn remove_by_handle(
        &mut self,
        arena: &mut UnitArena,
        handle: KernelHandle,
    ) -> Option<SlotId> {
        let mut cursor = self.head;
        while let Some(cur) = cursor {
            if arena[cur].record.handle == handle {
                self.unlink(arena, cur);
                return Some(cur);
            }
            cursor = arena[cur].next;
        }
        None
    }

    /// Detach the head without handle matching.  Used only to trim the
    /// overdue store down to its retention cap.
    pub fn pop_front(&mut self, arena: &mut UnitArena) -> Option<SlotId> {
        let head = self.head?;
        self.unlink(arena, head);
        Some(head)
    }

    /// One walk collecting every record whose deadline is strictly before
    /// `now`; each is detached with ownership passed out in head→tail order.
    pub fn drain_overdue(&mut self, arena: &mut UnitArena, now: Tick) -> Vec<SlotId> {
        let mut due = Vec::new();
        let mut cursor = self.head;
        while let Some(cur) = cursor {
            let next = arena[cur].next;
            if arena[cur].record.deadline < now {
                due.push(cur);
            }
            cursor = next;
        }
        for &slot in &due {
            self.unlink(arena, slot);
        }
        due
    }

    // ── Observation ───────────────────────────────────────────────────────────

    /// Walk the list head→tail.
    pub fn iter<'a>(&self, arena: &'a UnitArena) -> Iter<'a> {
        Iter {
            arena,
            cursor: self.head,
        }
    }

    /// Deterministic text snapshot of the list contents.
    ///
    /// One line per record in list order; an empty list renders as the
    /// sentinel line `Nothing in list.`.
    pub fn render(&self, arena: &UnitArena) -> String {
        if self.is_empty() {
            return String::from("Nothing in list.\n");
        }
        let mut out = String::new();
        for node in self.iter(arena) {
            let _ = writeln!(
                out,
                "Task: {} with deadline: {}",
                node.record.name, node.record.deadline
            );
        }
        out
    }
}

/// Head→tail iterator over the nodes of a [`DeadlineList`].
pub struct Iter<'a> {
    arena: &'a UnitArena,
    cursor: Option<SlotId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.cursor?;
        let node = &self.arena[cur];
        self.cursor = node.next;
        Some(node)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
