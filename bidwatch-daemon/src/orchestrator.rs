//! One poll cycle: `FETCH → DIFF → APPLY → CONFIRM → ADVANCE_BASELINE → RELOAD`.
//!
//! The [`Orchestrator`] is the only owner of the [`Baseline`]. The baseline
//! moves forward only after the file has been written *and* re-read with
//! the expected values; a failed reload does not undo that.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use bidwatch_core::{detect, Baseline, ParamKey, WatcherConfig};
use bidwatch_sync::{ApplyOutcome, ConfigStore, ConfigTarget, SyncError};

use crate::reload::{ReloadError, ServiceReloader};
use crate::source::{HttpSource, ParameterSource, SourceError};

/// A cycle that stopped before the baseline was advanced.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("poll failed: {0}")]
    Fetch(#[from] SourceError),

    #[error("failed to update config file: {0}")]
    Apply(#[source] SyncError),

    #[error("failed to confirm config file changes: {0}")]
    Confirm(#[source] SyncError),

    #[error("failed to preview config file changes: {0}")]
    Preview(#[source] SyncError),
}

#[derive(Debug)]
pub enum ReloadStatus {
    Succeeded,
    Failed(ReloadError),
}

/// Result of a cycle that did not fail before `ADVANCE_BASELINE`.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Nothing differed from the baseline.
    NoChange,
    /// The file holds the new values and the baseline was advanced.
    Applied {
        keys: Vec<ParamKey>,
        /// `false` when the file already had exactly this content.
        written: bool,
        reload: ReloadStatus,
    },
}

/// Serializable per-cycle report, printed by `bidwatch once`.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
    pub status: &'static str,
    pub keys: Vec<String>,
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CycleSummary {
    fn build(
        started_at: DateTime<Utc>,
        duration: Duration,
        result: &Result<CycleOutcome, CycleError>,
    ) -> Self {
        let mut summary = Self {
            started_at,
            duration_ms: duration.as_millis(),
            status: "no_change",
            keys: Vec::new(),
            written: false,
            reload_error: None,
            error: None,
        };
        match result {
            Ok(CycleOutcome::NoChange) => {}
            Ok(CycleOutcome::Applied {
                keys,
                written,
                reload,
            }) => {
                summary.status = "applied";
                summary.keys = keys.iter().map(ToString::to_string).collect();
                summary.written = *written;
                if let ReloadStatus::Failed(err) = reload {
                    summary.reload_error = Some(err.to_string());
                }
            }
            Err(err) => {
                summary.status = "failed";
                summary.error = Some(err.to_string());
            }
        }
        summary
    }

    pub fn is_failure(&self) -> bool {
        self.status == "failed"
    }
}

pub struct Orchestrator {
    source: Box<dyn ParameterSource>,
    target: Box<dyn ConfigTarget>,
    reloader: ServiceReloader,
    baseline: Baseline,
}

impl Orchestrator {
    pub fn new(
        source: Box<dyn ParameterSource>,
        target: Box<dyn ConfigTarget>,
        reloader: ServiceReloader,
    ) -> Self {
        Self {
            source,
            target,
            reloader,
            baseline: Baseline::new(),
        }
    }

    /// Wire up the HTTP source, the on-disk store, and the reloader
    /// selected by `config.dry_run`.
    pub fn from_config(config: &WatcherConfig) -> Self {
        Self::new(
            Box::new(HttpSource::new(&config.endpoint, config.fetch_timeout)),
            Box::new(ConfigStore::new(&config.env_path)),
            ServiceReloader::for_mode(config.dry_run, &config.service, config.use_sudo),
        )
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Run one cycle, log its result at the matching severity, and report.
    pub fn tick(&mut self) -> CycleSummary {
        let started_at = Utc::now();
        let started = Instant::now();
        let result = self.run_cycle();
        log_cycle_result(&result);
        CycleSummary::build(started_at, started.elapsed(), &result)
    }

    /// Run one cycle. Errors leave the baseline exactly as it was.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        let snapshot = self.source.fetch()?;

        let updates = detect::diff(&snapshot, &self.baseline);
        if updates.is_empty() {
            return Ok(CycleOutcome::NoChange);
        }
        tracing::info!(updates = %updates, "detected changes from endpoint");

        let applied = self.target.apply(&updates).map_err(CycleError::Apply)?;
        self.target
            .confirm(&updates)
            .map_err(CycleError::Confirm)?;

        self.baseline.advance(&snapshot);

        let reload = match self.reloader.reload_and_restart() {
            Ok(()) => ReloadStatus::Succeeded,
            Err(err) => ReloadStatus::Failed(err),
        };

        Ok(CycleOutcome::Applied {
            keys: updates.keys(),
            written: matches!(applied, ApplyOutcome::Written { .. }),
            reload,
        })
    }

    /// Fetch and diff, then render what `APPLY` would change without
    /// touching the file, the baseline, or the service.
    pub fn preview(&self) -> Result<Option<String>, CycleError> {
        let snapshot = self.source.fetch()?;
        let updates = detect::diff(&snapshot, &self.baseline);
        if updates.is_empty() {
            return Ok(None);
        }
        bidwatch_sync::preview(self.target.path(), &updates).map_err(CycleError::Preview)
    }

    pub fn describe(&self) -> String {
        format!(
            "{} -> {}",
            self.source.describe(),
            self.target.path().display()
        )
    }
}

fn log_cycle_result(result: &Result<CycleOutcome, CycleError>) {
    match result {
        Ok(CycleOutcome::NoChange) => tracing::info!("no changes detected from endpoint"),
        Ok(CycleOutcome::Applied {
            keys,
            written,
            reload: ReloadStatus::Succeeded,
        }) => tracing::info!(
            keys = ?keys,
            written,
            "config updated; reloaded systemd and restarted service",
        ),
        Ok(CycleOutcome::Applied {
            keys,
            reload: ReloadStatus::Failed(err),
            ..
        }) => tracing::warn!(
            keys = ?keys,
            error = %err,
            "config updated but reload/restart failed; service may be running stale config",
        ),
        Err(err @ CycleError::Fetch(_)) => tracing::warn!(error = %err, "poll error"),
        Err(err @ CycleError::Confirm(_)) => {
            tracing::error!(error = %err, "post-write verification failed; baseline unchanged")
        }
        Err(err) => tracing::error!(error = %err, "cycle aborted; baseline unchanged"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
