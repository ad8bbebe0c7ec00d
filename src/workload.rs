/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Demo workload: the producer loops that feed the scheduler.
//!
//! Each periodic source releases a fresh unit instance every period with
//! `deadline = release + period`; the single-shot aperiodic sources release
//! once at startup.  Producers follow the lifecycle handshake to the letter:
//! the execution context is created suspended, registered through the
//! [`UnitGate`], and resumed only once the scheduler acknowledged the
//! admission.  Each unit body retires itself through the same gate before
//! its context is destroyed.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::WorkloadConfig;
use crate::kernel::{Kernel, SimKernel};
use crate::scheduler::client::{Endpoints, UnitGate};
use crate::scheduler::error::HandshakeError;
use crate::unit::{UnitCategory, UnitRecord};

/// Spawn one producer task per configured workload source.
pub fn spawn(
    workload: &WorkloadConfig,
    kernel: &Arc<SimKernel>,
    endpoints: &Endpoints,
) -> Vec<JoinHandle<()>> {
    let mut producers = Vec::new();
    for source in &workload.periodic {
        let Some(gate) = endpoints.gate(source.id) else {
            warn!(unit = %source.id, "periodic source has no acknowledgment channel; skipping");
            continue;
        };
        let kernel = Arc::clone(kernel);
        let source = source.clone();
        producers.push(tokio::spawn(async move {
            let period = Duration::from_millis(source.period_ms);
            let mut gate = gate;
            loop {
                let released = release_instance(
                    &kernel,
                    &mut gate,
                    &source.name,
                    UnitCategory::Periodic,
                    source.period_ms,
                    source.execution_ms,
                )
                .await;
                if !released {
                    return;
                }
                tokio::time::sleep(period).await;
            }
        }));
    }
    for source in &workload.aperiodic {
        let Some(gate) = endpoints.gate(source.id) else {
            warn!(unit = %source.id, "aperiodic source has no acknowledgment channel; skipping");
            continue;
        };
        let kernel = Arc::clone(kernel);
        let source = source.clone();
        producers.push(tokio::spawn(async move {
            let mut gate = gate;
            release_instance(
                &kernel,
                &mut gate,
                &source.name,
                UnitCategory::Aperiodic,
                source.deadline_ms,
                source.execution_ms,
            )
            .await;
        }));
    }
    producers
}

/// Create one suspended instance, register it, and resume it on admission.
///
/// Returns `false` when the scheduler has stopped and the producer loop
/// should end.
async fn release_instance(
    kernel: &Arc<SimKernel>,
    gate: &mut UnitGate,
    name: &str,
    category: UnitCategory,
    relative_deadline_ms: u64,
    execution_ms: u64,
) -> bool {
    let now = kernel.now();
    let handle = kernel.create(name);
    let record = UnitRecord {
        id: gate.id(),
        name: name.to_owned(),
        category,
        start: now,
        deadline: now + relative_deadline_ms,
        handle,
    };

    tokio::spawn(unit_body(
        Arc::clone(kernel),
        gate.clone(),
        record.clone(),
        execution_ms,
    ));

    match gate.register(record).await {
        Ok(()) => {
            kernel.resume(handle);
            true
        }
        Err(HandshakeError::Rejected(err)) => {
            warn!(unit = name, %err, "admission rejected; instance will not run");
            kernel.destroy(handle);
            true
        }
        Err(HandshakeError::SchedulerGone) => {
            kernel.destroy(handle);
            false
        }
    }
}

/// One unit instance: wait for release, run for the configured execution
/// time, then retire through the gate and tear the context down.
async fn unit_body(
    kernel: Arc<SimKernel>,
    mut gate: UnitGate,
    record: UnitRecord,
    execution_ms: u64,
) {
    let Some(released) = kernel.release_signal(record.handle) else {
        return;
    };
    let Some(destroyed) = kernel.destroy_signal(record.handle) else {
        return;
    };

    tokio::select! {
        _ = released.notified() => {}
        // Never admitted; the producer tore the context down.
        _ = destroyed.notified() => return,
    }
    info!(
        unit = %record.name,
        tick = kernel.now(),
        band = ?kernel.band_of(record.handle),
        "released"
    );

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_millis(execution_ms)) => {}
        // Deadline passed mid-run; the scheduler stopped this context.
        _ = destroyed.notified() => return,
    }

    let finished = kernel.now();
    if finished > record.deadline {
        warn!(
            unit = %record.name,
            tick = finished,
            deadline = record.deadline,
            "completed past its deadline"
        );
    } else {
        info!(unit = %record.name, tick = finished, "completed");
    }

    // The scheduler must drop its bookkeeping before this context goes away.
    let _ = gate.retire(record.handle).await;
    kernel.destroy(record.handle);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::PriorityBands;
    use crate::config::SchedulerSettings;
    use crate::kernel::RunState;
    use crate::scheduler::Scheduler;
    use crate::unit::UnitId;

    fn settings() -> SchedulerSettings {
        SchedulerSettings {
            bands: PriorityBands::new(3, 13),
            command_queue_depth: 8,
            overdue_retention: 5,
            run_horizon: None,
        }
    }

    #[tokio::test]
    async fn admitted_instance_is_resumed_and_visible() {
        let kernel = Arc::new(SimKernel::new());
        let (scheduler, endpoints) = Scheduler::new(Arc::clone(&kernel), &settings(), [UnitId(1)]);
        let _actor = tokio::spawn(scheduler.run());
        let mut gate = endpoints.gate(UnitId(1)).unwrap();

        // Long execution and far deadline: the body stays running while we
        // look at the active list.
        let released = release_instance(
            &kernel,
            &mut gate,
            "Held Unit",
            UnitCategory::Periodic,
            60_000,
            60_000,
        )
        .await;
        assert!(released);

        let mut reporter = endpoints.reporter();
        let snap = reporter.active().await.unwrap();
        assert!(snap.rendered.contains("Task: Held Unit with deadline:"));
    }

    #[tokio::test]
    async fn completed_instance_retires_itself() {
        let kernel = Arc::new(SimKernel::new());
        let (scheduler, endpoints) = Scheduler::new(Arc::clone(&kernel), &settings(), [UnitId(1)]);
        let _actor = tokio::spawn(scheduler.run());
        let mut gate = endpoints.gate(UnitId(1)).unwrap();

        release_instance(
            &kernel,
            &mut gate,
            "Quick Unit",
            UnitCategory::Periodic,
            60_000,
            10,
        )
        .await;

        // Give the 10 ms body ample time to finish its retire handshake.
        tokio::time::sleep(Duration::from_millis(300)).await;

        let mut reporter = endpoints.reporter();
        let snap = reporter.active().await.unwrap();
        assert_eq!(snap.rendered, "Nothing in list.\n");
    }

    #[tokio::test]
    async fn rejected_instance_never_runs() {
        let kernel = Arc::new(SimKernel::new());
        // Capacity of one unit.
        let narrow = SchedulerSettings {
            bands: PriorityBands::new(3, 4),
            ..settings()
        };
        let (scheduler, endpoints) =
            Scheduler::new(Arc::clone(&kernel), &narrow, [UnitId(1), UnitId(2)]);
        let _actor = tokio::spawn(scheduler.run());

        let mut first = endpoints.gate(UnitId(1)).unwrap();
        assert!(
            release_instance(
                &kernel,
                &mut first,
                "Occupant",
                UnitCategory::Periodic,
                60_000,
                60_000,
            )
            .await
        );

        let mut second = endpoints.gate(UnitId(2)).unwrap();
        assert!(
            release_instance(
                &kernel,
                &mut second,
                "Turned Away",
                UnitCategory::Periodic,
                60_000,
                60_000,
            )
            .await
        );

        // The first context runs; the second was destroyed without ever
        // becoming runnable.
        use crate::unit::KernelHandle;
        assert_eq!(kernel.run_state(KernelHandle(1)), Some(RunState::Runnable));
        assert_eq!(kernel.run_state(KernelHandle(2)), Some(RunState::Destroyed));

        let mut reporter = endpoints.reporter();
        let snap = reporter.active().await.unwrap();
        assert!(snap.rendered.contains("Task: Occupant with deadline:"));
        assert!(!snap.rendered.contains("Turned Away"));
    }
}
