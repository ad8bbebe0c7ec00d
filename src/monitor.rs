//! Recurring report loop.
//!
//! At every cadence interval the monitor queries both scheduler lists and
//! logs the rendered snapshots.  It stops on its own once the scheduler is
//! gone.

use std::time::Duration;

use tracing::info;

use crate::scheduler::client::Reporter;

pub async fn run(mut reporter: Reporter, cadence_ms: u64) {
    let mut ticker = tokio::time::interval(Duration::from_millis(cadence_ms));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first interval tick completes immediately; consume it so the first
    // report lands one full cadence after startup.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Ok(active) = reporter.active().await else {
            return;
        };
        info!(tick = active.tick, "Active units:\n{}", active.rendered.trim_end());
        let Ok(overdue) = reporter.overdue().await else {
            return;
        };
        info!(tick = overdue.tick, "Overdue units:\n{}", overdue.rendered.trim_end());
    }
}
