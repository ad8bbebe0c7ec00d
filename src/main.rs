/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use ddsched::config::Config;
use ddsched::kernel::SimKernel;
use ddsched::monitor;
use ddsched::scheduler::Scheduler;
use ddsched::workload;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Deadline-driven scheduling bridge.
///
/// Example:
///   ddsched --config bench.yaml --horizon 3000
#[derive(Debug, Parser)]
#[command(
    name = "ddsched",
    about = "Deadline-driven scheduling bridge – maps EDF order onto fixed kernel priorities",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML scheduler/workload configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Override the run horizon in milliseconds (0 disables the horizon).
    #[arg(long = "horizon")]
    horizon_ms: Option<u64>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("ddsched starting up...");

    // ── Parse CLI arguments and load configuration ────────────────────────────
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load configuration: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("No configuration file provided, using built-in bench defaults");
            Config::default()
        }
    };
    if let Some(horizon) = cli.horizon_ms {
        config.scheduler.run_horizon = (horizon > 0).then_some(horizon);
    }

    info!(
        capacity = config.scheduler.bands.capacity(),
        retention = config.scheduler.overdue_retention,
        horizon = ?config.scheduler.run_horizon,
        cadence = config.monitor.cadence_ms,
        periodic = config.workload.periodic.len(),
        aperiodic = config.workload.aperiodic.len(),
        "Configuration"
    );

    // ── Wire the actor, monitor and producers ─────────────────────────────────
    let kernel = Arc::new(SimKernel::new());
    let (scheduler, endpoints) = Scheduler::new(
        Arc::clone(&kernel),
        &config.scheduler,
        config.workload.unit_ids(),
    );

    let actor = tokio::spawn(scheduler.run());
    let reports = tokio::spawn(monitor::run(endpoints.reporter(), config.monitor.cadence_ms));
    let producers = workload::spawn(&config.workload, &kernel, &endpoints);

    // The endpoints stay alive until the actor returns, so the command queue
    // only closes on one of the explicit shutdown paths.
    match actor.await {
        Ok(exit) => info!(%exit, "scheduler stopped"),
        Err(e) => error!("scheduling actor panicked: {e}"),
    }

    reports.abort();
    for producer in producers {
        producer.abort();
    }
}
