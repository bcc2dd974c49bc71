//! Local experiment tracking
//!
//! Records one run's parameters, metrics, and artifact paths under a named
//! experiment and persists everything as JSON in a tracking directory.
//! Artifacts written through the tracker land in a per-run subdirectory.

use crate::error::{FleetError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::info;

/// A metric value recorded at a step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub step: u64,
    pub timestamp: i64,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64, step: u64) -> Self {
        Self {
            name: name.into(),
            value,
            step,
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// One training attempt within an experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    pub run_name: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub params: HashMap<String, String>,
    pub metrics: HashMap<String, f64>,
    pub metrics_history: Vec<Metric>,
    pub artifacts: Vec<String>,
    pub status: RunStatus,
}

impl Run {
    fn new(run_name: impl Into<String>) -> Self {
        let run_name = run_name.into();
        let run_id = format!("run_{}", Utc::now().timestamp_micros());
        Self {
            run_id,
            run_name,
            start_time: Utc::now().timestamp(),
            end_time: None,
            params: HashMap::new(),
            metrics: HashMap::new(),
            metrics_history: Vec::new(),
            artifacts: Vec::new(),
            status: RunStatus::Running,
        }
    }
}

/// A named experiment holding completed runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub name: String,
    pub created_at: i64,
    pub runs: Vec<Run>,
}

impl Experiment {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now().timestamp(),
            runs: Vec::new(),
        }
    }
}

/// File-backed experiment tracker.
///
/// One experiment and at most one open run at a time; the run moves into
/// the experiment when it ends. `save` writes the experiment file and is
/// expected once per run boundary.
pub struct ExperimentTracker {
    base_dir: PathBuf,
    experiment: RwLock<Experiment>,
    current_run: RwLock<Option<Run>>,
}

impl ExperimentTracker {
    /// Open (or create) an experiment in `base_dir`.
    ///
    /// An existing experiment file with the same name is loaded so new runs
    /// append to its history.
    pub fn new(base_dir: impl Into<PathBuf>, experiment_name: impl Into<String>) -> Result<Self> {
        let base_dir = base_dir.into();
        let name = experiment_name.into();
        fs::create_dir_all(&base_dir)?;

        let file = Self::experiment_file(&base_dir, &name);
        let experiment = if file.exists() {
            let contents = fs::read_to_string(&file)?;
            serde_json::from_str(&contents)?
        } else {
            Experiment::new(&name)
        };

        Ok(Self {
            base_dir,
            experiment: RwLock::new(experiment),
            current_run: RwLock::new(None),
        })
    }

    fn experiment_file(base_dir: &Path, name: &str) -> PathBuf {
        base_dir.join(format!("{name}.json"))
    }

    /// Start a new run; any unfinished run is discarded.
    pub fn start_run(&self, run_name: impl Into<String>) -> String {
        let run = Run::new(run_name);
        let run_id = run.run_id.clone();
        info!(run_id = %run_id, "run started");
        if let Ok(mut current) = self.current_run.write() {
            *current = Some(run);
        }
        run_id
    }

    /// Log a parameter on the current run
    pub fn log_param(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut run) = self.current_run.write() {
            if let Some(ref mut r) = *run {
                r.params.insert(key.into(), value.into());
            }
        }
    }

    /// Log a batch of parameters
    pub fn log_params<I, K, V>(&self, params: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            self.log_param(key, value);
        }
    }

    /// Log a metric; with a step the value is also appended to the history
    pub fn log_metric(&self, name: impl Into<String>, value: f64, step: Option<u64>) {
        let name = name.into();
        if let Ok(mut run) = self.current_run.write() {
            if let Some(ref mut r) = *run {
                r.metrics.insert(name.clone(), value);
                if let Some(step) = step {
                    r.metrics_history.push(Metric::new(&name, value, step));
                }
            }
        }
    }

    /// Record an artifact path on the current run
    pub fn log_artifact(&self, path: impl AsRef<Path>) {
        if let Ok(mut run) = self.current_run.write() {
            if let Some(ref mut r) = *run {
                r.artifacts.push(path.as_ref().display().to_string());
            }
        }
    }

    /// Serialize `value` as a JSON artifact in the run directory and record
    /// it. Returns the written path.
    pub fn log_json_artifact<T: Serialize>(&self, filename: &str, value: &T) -> Result<PathBuf> {
        let run_id = {
            let run = self
                .current_run
                .read()
                .map_err(|_| FleetError::TrackingError("tracker lock poisoned".into()))?;
            run.as_ref()
                .map(|r| r.run_id.clone())
                .ok_or_else(|| FleetError::TrackingError("no active run".into()))?
        };

        let run_dir = self.base_dir.join(&run_id);
        fs::create_dir_all(&run_dir)?;
        let path = run_dir.join(filename);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)?;
        self.log_artifact(&path);
        Ok(path)
    }

    /// End the current run with the given status and move it into the
    /// experiment.
    pub fn end_run(&self, status: RunStatus) {
        let completed = {
            let mut guard = match self.current_run.write() {
                Ok(g) => g,
                Err(_) => return,
            };
            if let Some(ref mut r) = *guard {
                r.end_time = Some(Utc::now().timestamp());
                r.status = status;
            }
            guard.take()
        };

        if let Some(run) = completed {
            info!(run_id = %run.run_id, status = ?run.status, "run ended");
            if let Ok(mut exp) = self.experiment.write() {
                exp.runs.push(run);
            }
        }
    }

    /// Snapshot of the current run, if one is open
    pub fn current_run(&self) -> Option<Run> {
        self.current_run.read().ok().and_then(|r| r.clone())
    }

    /// Snapshot of the experiment
    pub fn experiment(&self) -> Option<Experiment> {
        self.experiment.read().ok().map(|e| e.clone())
    }

    /// Persist the experiment file
    pub fn save(&self) -> Result<()> {
        let experiment = self
            .experiment
            .read()
            .map_err(|_| FleetError::TrackingError("tracker lock poisoned".into()))?
            .clone();
        let file = Self::experiment_file(&self.base_dir, &experiment.name);
        let json = serde_json::to_string_pretty(&experiment)?;
        fs::write(&file, json)?;
        Ok(())
    }
}
