//! Scheduler and workload configuration loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! scheduler:
//!   priority_floor: 3
//!   priority_ceiling: 13
//!   command_queue_depth: 10
//!   overdue_retention: 5
//!   run_horizon_ms: 1500      # null = run forever
//! monitor:
//!   cadence_ms: 500
//! workload:
//!   periodic:
//!     - { id: 1, name: "Deadline Unit 1", period_ms: 500, execution_ms: 95 }
//!   aperiodic:
//!     - { id: 4, name: "Aperiodic Unit", deadline_ms: 500, execution_ms: 200 }
//! ```
//!
//! Every section is optional; missing values fall back to the built-in
//! bench defaults (three periodic sources plus one aperiodic source).

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::bands::PriorityBands;
use crate::unit::{Tick, UnitId};

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
///
/// Kept private – callers work with [`Config`] instead.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    scheduler: SchedulerSection,
    #[serde(default)]
    monitor: MonitorSection,
    workload: Option<WorkloadSection>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SchedulerSection {
    priority_floor: u32,
    priority_ceiling: u32,
    command_queue_depth: usize,
    overdue_retention: u32,
    /// `null` disables the horizon entirely.
    run_horizon_ms: Option<Tick>,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            priority_floor: 3,
            priority_ceiling: 13,
            command_queue_depth: 10,
            overdue_retention: 5,
            run_horizon_ms: Some(1500),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MonitorSection {
    cadence_ms: u64,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self { cadence_ms: 500 }
    }
}

#[derive(Debug, Deserialize)]
struct WorkloadSection {
    #[serde(default)]
    periodic: Vec<PeriodicEntry>,
    #[serde(default)]
    aperiodic: Vec<AperiodicEntry>,
}

#[derive(Debug, Deserialize)]
struct PeriodicEntry {
    id: u32,
    name: String,
    period_ms: u64,
    execution_ms: u64,
}

#[derive(Debug, Deserialize)]
struct AperiodicEntry {
    id: u32,
    name: String,
    deadline_ms: u64,
    execution_ms: u64,
}

// ── Public configuration types ────────────────────────────────────────────────

/// Settings consumed by the scheduling actor.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub bands: PriorityBands,
    pub command_queue_depth: usize,
    /// Maximum number of records retained in the overdue store.
    pub overdue_retention: u32,
    /// Tick past which the actor performs a controlled shutdown; `None`
    /// runs forever.
    pub run_horizon: Option<Tick>,
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub cadence_ms: u64,
}

/// One periodic workload source: releases a fresh unit every `period_ms`
/// with `deadline = release + period_ms`.
#[derive(Debug, Clone)]
pub struct PeriodicSource {
    pub id: UnitId,
    pub name: String,
    pub period_ms: u64,
    pub execution_ms: u64,
}

/// One aperiodic workload source: releases a single unit at startup with a
/// relative deadline of `deadline_ms`.
#[derive(Debug, Clone)]
pub struct AperiodicSource {
    pub id: UnitId,
    pub name: String,
    pub deadline_ms: u64,
    pub execution_ms: u64,
}

#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    pub periodic: Vec<PeriodicSource>,
    pub aperiodic: Vec<AperiodicSource>,
}

impl WorkloadConfig {
    /// The fixed set of unit ids the acknowledgment registry is built from.
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.periodic
            .iter()
            .map(|s| s.id)
            .chain(self.aperiodic.iter().map(|s| s.id))
            .collect()
    }
}

/// Full configuration for one scheduler run.
#[derive(Debug, Clone)]
pub struct Config {
    pub scheduler: SchedulerSettings,
    pub monitor: MonitorSettings,
    pub workload: WorkloadConfig,
}

impl Default for Config {
    /// Built-in bench defaults, used when no file is supplied.
    fn default() -> Self {
        let s = SchedulerSection::default();
        let m = MonitorSection::default();
        Config {
            scheduler: SchedulerSettings {
                bands: PriorityBands::new(s.priority_floor, s.priority_ceiling),
                command_queue_depth: s.command_queue_depth,
                overdue_retention: s.overdue_retention,
                run_horizon: s.run_horizon_ms,
            },
            monitor: MonitorSettings {
                cadence_ms: m.cadence_ms,
            },
            workload: Self::default_workload(),
        }
    }
}

impl Config {
    /// Parses `path` into a validated [`Config`].
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, if the YAML is
    /// structurally invalid, or if the values fail validation.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        Self::from_file_repr(file)
            .with_context(|| format!("Invalid configuration: {}", path.display()))
    }

    fn from_file_repr(file: ConfigFile) -> Result<Self> {
        let s = file.scheduler;
        if s.priority_ceiling <= s.priority_floor {
            bail!(
                "priority_ceiling ({}) must be above priority_floor ({})",
                s.priority_ceiling,
                s.priority_floor
            );
        }
        if s.command_queue_depth == 0 {
            bail!("command_queue_depth must be at least 1");
        }
        if file.monitor.cadence_ms == 0 {
            bail!("monitor cadence_ms must be at least 1");
        }

        let workload = match file.workload {
            Some(section) => WorkloadConfig {
                periodic: section
                    .periodic
                    .into_iter()
                    .map(|e| PeriodicSource {
                        id: UnitId(e.id),
                        name: e.name,
                        period_ms: e.period_ms,
                        execution_ms: e.execution_ms,
                    })
                    .collect(),
                aperiodic: section
                    .aperiodic
                    .into_iter()
                    .map(|e| AperiodicSource {
                        id: UnitId(e.id),
                        name: e.name,
                        deadline_ms: e.deadline_ms,
                        execution_ms: e.execution_ms,
                    })
                    .collect(),
            },
            None => Self::default_workload(),
        };

        for source in &workload.periodic {
            if source.period_ms == 0 {
                bail!("periodic source '{}' has a zero period", source.name);
            }
        }
        for source in &workload.aperiodic {
            if source.deadline_ms == 0 {
                bail!("aperiodic source '{}' has a zero deadline", source.name);
            }
        }
        let ids = workload.unit_ids();
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                bail!("duplicate workload unit id {id}");
            }
        }

        Ok(Config {
            scheduler: SchedulerSettings {
                bands: PriorityBands::new(s.priority_floor, s.priority_ceiling),
                command_queue_depth: s.command_queue_depth,
                overdue_retention: s.overdue_retention,
                run_horizon: s.run_horizon_ms,
            },
            monitor: MonitorSettings {
                cadence_ms: file.monitor.cadence_ms,
            },
            workload,
        })
    }

    /// The bench workload used when the file has no `workload` section.
    fn default_workload() -> WorkloadConfig {
        WorkloadConfig {
            periodic: vec![
                PeriodicSource {
                    id: UnitId(1),
                    name: String::from("Deadline Unit 1"),
                    period_ms: 500,
                    execution_ms: 95,
                },
                PeriodicSource {
                    id: UnitId(2),
                    name: String::from("Deadline Unit 2"),
                    period_ms: 500,
                    execution_ms: 150,
                },
                PeriodicSource {
                    id: UnitId(3),
                    name: String::from("Deadline Unit 3"),
                    period_ms: 750,
                    execution_ms: 250,
                },
            ],
            aperiodic: vec![AperiodicSource {
                id: UnitId(4),
                name: String::from("Aperiodic Unit"),
                deadline_ms: 500,
                execution_ms: 200,
            }],
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_mirror_the_bench_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.scheduler.bands.capacity(), 10);
        assert_eq!(cfg.scheduler.overdue_retention, 5);
        assert_eq!(cfg.scheduler.run_horizon, Some(1500));
        assert_eq!(cfg.monitor.cadence_ms, 500);
        assert_eq!(cfg.workload.periodic.len(), 3);
        assert_eq!(cfg.workload.aperiodic.len(), 1);
        assert_eq!(
            cfg.workload.unit_ids(),
            vec![UnitId(1), UnitId(2), UnitId(3), UnitId(4)]
        );
    }

    #[test]
    fn load_full_yaml() {
        let yaml = r#"
scheduler:
  priority_floor: 2
  priority_ceiling: 8
  command_queue_depth: 4
  overdue_retention: 3
  run_horizon_ms: 2000
monitor:
  cadence_ms: 250
workload:
  periodic:
    - { id: 1, name: "P1", period_ms: 100, execution_ms: 20 }
    - { id: 2, name: "P2", period_ms: 200, execution_ms: 40 }
  aperiodic:
    - { id: 9, name: "A", deadline_ms: 300, execution_ms: 50 }
"#;
        let f = yaml_tempfile(yaml);
        let cfg = Config::load(f.path()).unwrap();

        assert_eq!(cfg.scheduler.bands.capacity(), 6);
        assert_eq!(cfg.scheduler.command_queue_depth, 4);
        assert_eq!(cfg.scheduler.overdue_retention, 3);
        assert_eq!(cfg.scheduler.run_horizon, Some(2000));
        assert_eq!(cfg.monitor.cadence_ms, 250);
        assert_eq!(cfg.workload.periodic[1].name, "P2");
        assert_eq!(cfg.workload.aperiodic[0].deadline_ms, 300);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let yaml = "scheduler:\n  priority_floor: 1\n  priority_ceiling: 5\n";
        let f = yaml_tempfile(yaml);
        let cfg = Config::load(f.path()).unwrap();

        assert_eq!(cfg.scheduler.bands.capacity(), 4);
        // Unspecified scheduler fields keep their defaults.
        assert_eq!(cfg.scheduler.overdue_retention, 5);
        // Missing workload section keeps the bench sources.
        assert_eq!(cfg.workload.periodic.len(), 3);
    }

    #[test]
    fn null_run_horizon_disables_the_bound() {
        let yaml = "scheduler:\n  run_horizon_ms: null\n";
        let f = yaml_tempfile(yaml);
        let cfg = Config::load(f.path()).unwrap();
        assert_eq!(cfg.scheduler.run_horizon, None);
    }

    #[test]
    fn inverted_priority_range_is_rejected() {
        let yaml = "scheduler:\n  priority_floor: 9\n  priority_ceiling: 3\n";
        let f = yaml_tempfile(yaml);
        assert!(Config::load(f.path()).is_err());
    }

    #[test]
    fn duplicate_unit_ids_are_rejected() {
        let yaml = r#"
workload:
  periodic:
    - { id: 1, name: "P1", period_ms: 100, execution_ms: 20 }
  aperiodic:
    - { id: 1, name: "A", deadline_ms: 300, execution_ms: 50 }
"#;
        let f = yaml_tempfile(yaml);
        assert!(Config::load(f.path()).is_err());
    }

    #[test]
    fn zero_period_is_rejected() {
        let yaml = r#"
workload:
  periodic:
    - { id: 1, name: "P1", period_ms: 0, execution_ms: 20 }
"#;
        let f = yaml_tempfile(yaml);
        assert!(Config::load(f.path()).is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        assert!(Config::load(Path::new("/nonexistent/path/config.yaml")).is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(Config::load(f.path()).is_err());
    }
}
