/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Seam to the underlying fixed-priority preemptive kernel.
//!
//! The scheduler itself never dispatches anything; it relies on a kernel that
//! already does preemptive fixed-priority scheduling and only needs to be
//! told *which* priority each execution context should hold right now.  That
//! dependency is expressed as the [`Kernel`] trait so the scheduling logic is
//! testable without a real kernel underneath.
//!
//! [`SimKernel`] is the in-process stand-in used by the binary: it keeps a
//! per-handle state table and wakes unit bodies through [`Notify`] signals,
//! so a resumed context starts running and a destroyed one actually stops.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::Notify;
use tracing::debug;

use crate::bands::PriorityBand;
use crate::unit::{KernelHandle, Tick};

// ── Kernel trait ──────────────────────────────────────────────────────────────

/// Operations the scheduler needs from the underlying kernel.
pub trait Kernel: Send + Sync + 'static {
    /// Current monotonic tick.
    fn now(&self) -> Tick;

    /// Create a new execution context in the suspended state.
    fn create(&self, name: &str) -> KernelHandle;

    /// Move `handle` to the given priority band.
    fn set_priority(&self, handle: KernelHandle, band: PriorityBand);

    /// Stop `handle` from being dispatched until resumed.
    fn suspend(&self, handle: KernelHandle);

    /// Make `handle` dispatchable again.
    fn resume(&self, handle: KernelHandle);

    /// Tear `handle` down; it never runs again.
    fn destroy(&self, handle: KernelHandle);
}

// ── SimKernel ─────────────────────────────────────────────────────────────────

/// Dispatch state of a simulated execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Suspended,
    Runnable,
    Destroyed,
}

#[derive(Debug)]
struct ContextState {
    name: String,
    band: Option<PriorityBand>,
    run: RunState,
    released: Arc<Notify>,
    destroyed: Arc<Notify>,
}

/// In-process kernel simulation.
///
/// Ticks are wall-clock milliseconds since construction.  Priorities are
/// recorded but not enforced — the tokio runtime underneath has no priority
/// dispatch; what matters to the scheduler's own correctness is the state
/// bookkeeping and the release/destroy signalling, both of which are real.
#[derive(Debug)]
pub struct SimKernel {
    epoch: Instant,
    next_handle: AtomicU64,
    contexts: Mutex<HashMap<KernelHandle, ContextState>>,
}

impl SimKernel {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            next_handle: AtomicU64::new(1),
            contexts: Mutex::new(HashMap::new()),
        }
    }

    fn with_context<R>(
        &self,
        handle: KernelHandle,
        f: impl FnOnce(&mut ContextState) -> R,
    ) -> Option<R> {
        let mut contexts = self.contexts.lock().unwrap_or_else(|e| e.into_inner());
        contexts.get_mut(&handle).map(f)
    }

    /// Signal fired when the context is resumed for the first time.
    pub fn release_signal(&self, handle: KernelHandle) -> Option<Arc<Notify>> {
        self.with_context(handle, |ctx| Arc::clone(&ctx.released))
    }

    /// Signal fired when the context is destroyed.
    pub fn destroy_signal(&self, handle: KernelHandle) -> Option<Arc<Notify>> {
        self.with_context(handle, |ctx| Arc::clone(&ctx.destroyed))
    }

    /// Last priority band assigned to `handle`, if any.
    pub fn band_of(&self, handle: KernelHandle) -> Option<PriorityBand> {
        self.with_context(handle, |ctx| ctx.band).flatten()
    }

    /// Dispatch state of `handle`, or `None` for an unknown handle.
    pub fn run_state(&self, handle: KernelHandle) -> Option<RunState> {
        self.with_context(handle, |ctx| ctx.run)
    }
}

impl Default for SimKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for SimKernel {
    fn now(&self) -> Tick {
        self.epoch.elapsed().as_millis() as Tick
    }

    fn create(&self, name: &str) -> KernelHandle {
        let handle = KernelHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let state = ContextState {
            name: name.to_owned(),
            band: None,
            run: RunState::Suspended,
            released: Arc::new(Notify::new()),
            destroyed: Arc::new(Notify::new()),
        };
        let mut contexts = self.contexts.lock().unwrap_or_else(|e| e.into_inner());
        contexts.insert(handle, state);
        debug!(%handle, name = %name, "context created (suspended)");
        handle
    }

    fn set_priority(&self, handle: KernelHandle, band: PriorityBand) {
        self.with_context(handle, |ctx| {
            ctx.band = Some(band);
        });
    }

    fn suspend(&self, handle: KernelHandle) {
        self.with_context(handle, |ctx| {
            if ctx.run == RunState::Runnable {
                ctx.run = RunState::Suspended;
            }
        });
    }

    fn resume(&self, handle: KernelHandle) {
        if let Some(released) = self.with_context(handle, |ctx| {
            ctx.run = RunState::Runnable;
            Arc::clone(&ctx.released)
        }) {
            released.notify_one();
        }
    }

    fn destroy(&self, handle: KernelHandle) {
        if let Some((name, destroyed)) = self.with_context(handle, |ctx| {
            ctx.run = RunState::Destroyed;
            (ctx.name.clone(), Arc::clone(&ctx.destroyed))
        }) {
            destroyed.notify_one();
            debug!(%handle, name = %name, "context destroyed");
        }
    }
}

// ── ManualKernel (test support) ───────────────────────────────────────────────

/// Kernel call recorded by [`ManualKernel`].
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelCall {
    SetPriority(KernelHandle, PriorityBand),
    Suspend(KernelHandle),
    Resume(KernelHandle),
    Destroy(KernelHandle),
}

/// Deterministic kernel double: the clock only moves when a test says so and
/// every call is recorded for assertion.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualKernel {
    tick: AtomicU64,
    next_handle: AtomicU64,
    calls: Mutex<Vec<KernelCall>>,
}

#[cfg(test)]
impl ManualKernel {
    pub fn new() -> Self {
        Self {
            tick: AtomicU64::new(0),
            next_handle: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_tick(&self, tick: Tick) {
        self.tick.store(tick, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<KernelCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Most recent band assigned to `handle`.
    pub fn band_of(&self, handle: KernelHandle) -> Option<PriorityBand> {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                KernelCall::SetPriority(h, band) if h == handle => Some(band),
                _ => None,
            })
    }

    pub fn was_destroyed(&self, handle: KernelHandle) -> bool {
        self.calls().contains(&KernelCall::Destroy(handle))
    }

    pub fn was_suspended(&self, handle: KernelHandle) -> bool {
        self.calls().contains(&KernelCall::Suspend(handle))
    }

    fn record(&self, call: KernelCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }
}

#[cfg(test)]
impl Kernel for ManualKernel {
    fn now(&self) -> Tick {
        self.tick.load(Ordering::SeqCst)
    }

    fn create(&self, _name: &str) -> KernelHandle {
        KernelHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    fn set_priority(&self, handle: KernelHandle, band: PriorityBand) {
        self.record(KernelCall::SetPriority(handle, band));
    }

    fn suspend(&self, handle: KernelHandle) {
        self.record(KernelCall::Suspend(handle));
    }

    fn resume(&self, handle: KernelHandle) {
        self.record(KernelCall::Resume(handle));
    }

    fn destroy(&self, handle: KernelHandle) {
        self.record(KernelCall::Destroy(handle));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_contexts_start_suspended_without_a_band() {
        let kernel = SimKernel::new();
        let handle = kernel.create("unit");
        assert_eq!(kernel.run_state(handle), Some(RunState::Suspended));
        assert_eq!(kernel.band_of(handle), None);
    }

    #[test]
    fn resume_and_suspend_toggle_run_state() {
        let kernel = SimKernel::new();
        let handle = kernel.create("unit");
        kernel.resume(handle);
        assert_eq!(kernel.run_state(handle), Some(RunState::Runnable));
        kernel.suspend(handle);
        assert_eq!(kernel.run_state(handle), Some(RunState::Suspended));
    }

    #[test]
    fn destroy_is_terminal() {
        let kernel = SimKernel::new();
        let handle = kernel.create("unit");
        kernel.destroy(handle);
        assert_eq!(kernel.run_state(handle), Some(RunState::Destroyed));
    }

    #[test]
    fn set_priority_is_observable() {
        let kernel = SimKernel::new();
        let handle = kernel.create("unit");
        kernel.set_priority(handle, PriorityBand(7));
        assert_eq!(kernel.band_of(handle), Some(PriorityBand(7)));
    }

    #[tokio::test]
    async fn resume_before_wait_still_releases_the_body() {
        let kernel = SimKernel::new();
        let handle = kernel.create("unit");
        let released = kernel.release_signal(handle).unwrap();
        // Resume fires before anyone waits; the stored permit must survive.
        kernel.resume(handle);
        released.notified().await;
    }

    #[test]
    fn unknown_handle_operations_are_inert() {
        let kernel = SimKernel::new();
        let ghost = KernelHandle(999);
        kernel.set_priority(ghost, PriorityBand(5));
        kernel.suspend(ghost);
        kernel.destroy(ghost);
        assert_eq!(kernel.run_state(ghost), None);
    }
}
