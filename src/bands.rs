/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Priority-band derivation for the active list.
//!
//! The underlying kernel only understands fixed numeric priorities, so the
//! scheduler translates list *position* into a priority band: the head of the
//! active list (earliest deadline) holds the highest derived band and every
//! subsequent position holds exactly one band less, down to the configured
//! floor at the tail.  The derivation is a pure function of `(position, len)`
//! and is recomputed from scratch after every list mutation; bands are never
//! patched incrementally.
//!
//! Bands at and above `ceiling` are reserved for non-scheduling system tasks
//! (producers, the monitor, the scheduling actor itself).  An insert that
//! would push the head band into the reserved range is refused — the list is
//! at capacity.

use crate::scheduler::error::AdmissionError;

/// One discrete kernel priority level.  Higher value preempts lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriorityBand(pub u32);

impl std::fmt::Display for PriorityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The contiguous range of kernel priorities available to scheduled units:
/// `floor..ceiling`, tail at `floor`, head growing toward (never reaching)
/// `ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityBands {
    floor: u32,
    ceiling: u32,
}

impl PriorityBands {
    /// `ceiling` must be strictly above `floor`; validated at configuration
    /// load, debug-asserted here.
    pub fn new(floor: u32, ceiling: u32) -> Self {
        debug_assert!(ceiling > floor, "priority ceiling must be above floor");
        Self { floor, ceiling }
    }

    /// Number of units the active list can hold before the head band would
    /// collide with the reserved range.
    pub fn capacity(&self) -> u32 {
        self.ceiling - self.floor
    }

    /// Whether a list of `len` units fits entirely under the ceiling.
    pub fn admits(&self, len: u32) -> bool {
        len <= self.capacity()
    }

    /// Derived band for the unit at `position` (0 = head) in a list of `len`.
    ///
    /// Head: `floor + len - 1`.  Tail: `floor`.  Strictly decreasing from
    /// head to tail.
    pub fn band_at(&self, position: u32, len: u32) -> PriorityBand {
        debug_assert!(position < len, "position {position} out of range for len {len}");
        debug_assert!(self.admits(len), "len {len} exceeds band capacity");
        PriorityBand(self.floor + (len - 1 - position))
    }

    /// Check an insert that would grow the list to `new_len` units.
    pub fn check_insert(&self, new_len: u32) -> Result<(), AdmissionError> {
        if self.admits(new_len) {
            Ok(())
        } else {
            Err(AdmissionError::BandsExhausted {
                active: new_len - 1,
                capacity: self.capacity(),
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_ceiling_minus_floor() {
        assert_eq!(PriorityBands::new(3, 13).capacity(), 10);
        assert_eq!(PriorityBands::new(1, 2).capacity(), 1);
    }

    #[test]
    fn head_gets_highest_band_tail_gets_floor() {
        let bands = PriorityBands::new(3, 13);
        assert_eq!(bands.band_at(0, 4), PriorityBand(6));
        assert_eq!(bands.band_at(3, 4), PriorityBand(3));
    }

    #[test]
    fn bands_strictly_decrease_head_to_tail() {
        let bands = PriorityBands::new(3, 13);
        for len in 1..=10u32 {
            for pos in 1..len {
                assert!(bands.band_at(pos - 1, len) > bands.band_at(pos, len));
            }
        }
    }

    #[test]
    fn single_unit_sits_at_the_floor() {
        let bands = PriorityBands::new(3, 13);
        assert_eq!(bands.band_at(0, 1), PriorityBand(3));
    }

    #[test]
    fn admits_up_to_capacity_and_no_further() {
        let bands = PriorityBands::new(3, 13);
        assert!(bands.admits(10));
        assert!(!bands.admits(11));
        assert!(bands.check_insert(10).is_ok());
        let err = bands.check_insert(11).unwrap_err();
        assert_eq!(
            err,
            AdmissionError::BandsExhausted {
                active: 10,
                capacity: 10
            }
        );
    }

    #[test]
    fn full_list_never_reaches_the_ceiling() {
        let bands = PriorityBands::new(3, 13);
        // at capacity the head band is ceiling - 1
        assert_eq!(bands.band_at(0, 10), PriorityBand(12));
    }
}
