//! Decay and eviction pass over the trend table.
//!
//! A pass runs three independent steps in a fixed order: reset elapsed
//! daily windows, reset elapsed weekly windows, evict cold low-count
//! records. Each step is a single statement and therefore its own
//! transaction. A failed or stalled step does not stop the steps after it,
//! and running a pass twice for the same `now` changes nothing the second
//! time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::TrendConfig;
use crate::db::Store;
use crate::services::trend_service::TrendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStep {
    ResetDaily,
    ResetWeekly,
    EvictStale,
}

impl MaintenanceStep {
    pub const ALL: [Self; 3] = [Self::ResetDaily, Self::ResetWeekly, Self::EvictStale];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResetDaily => "reset_daily",
            Self::ResetWeekly => "reset_weekly",
            Self::EvictStale => "evict_stale",
        }
    }
}

impl std::fmt::Display for MaintenanceStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: MaintenanceStep,
    pub status: StepStatus,
    pub rows_affected: u64,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceReport {
    pub ran_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,

    /// `None` when the count query itself failed.
    pub total_records: Option<u64>,

    /// Records searched within the weekly window.
    pub active_records: Option<u64>,

    pub duration_ms: u64,
}

impl MaintenanceReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.steps
            .iter()
            .all(|s| s.status == StepStatus::Completed)
    }

    #[must_use]
    pub fn step(&self, step: MaintenanceStep) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == step)
    }

    /// Rows touched by `step`, zero if it did not complete.
    #[must_use]
    pub fn rows(&self, step: MaintenanceStep) -> u64 {
        self.step(step).map_or(0, |s| s.rows_affected)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[derive(Clone)]
pub struct MaintenanceJob {
    store: Store,
    config: TrendConfig,
    in_flight: Arc<Mutex<()>>,
}

impl MaintenanceJob {
    #[must_use]
    pub fn new(store: Store, config: TrendConfig) -> Self {
        Self {
            store,
            config,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Runs a full pass unless one is already in flight.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<MaintenanceReport, TrendError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            return Err(TrendError::MaintenanceInProgress);
        };

        let start = Instant::now();
        info!(event = "job_started", job_name = "trend_maintenance", now = %now, "Starting trend maintenance pass");

        let mut steps = Vec::with_capacity(MaintenanceStep::ALL.len());
        for step in MaintenanceStep::ALL {
            steps.push(self.run_step(step, now).await);
        }

        let step_timeout = self.config.step_timeout();
        let total_records =
            Self::bounded("count_records", step_timeout, self.store.count_trends()).await;
        let active_records = Self::bounded(
            "count_active",
            step_timeout,
            self.store
                .count_active_since(now, self.config.weekly_window()),
        )
        .await;

        let report = MaintenanceReport {
            ran_at: now,
            steps,
            total_records,
            active_records,
            duration_ms: elapsed_ms(start),
        };

        if report.is_success() {
            info!(
                event = "job_finished",
                job_name = "trend_maintenance",
                duration_ms = report.duration_ms,
                daily_reset = report.rows(MaintenanceStep::ResetDaily),
                weekly_reset = report.rows(MaintenanceStep::ResetWeekly),
                evicted = report.rows(MaintenanceStep::EvictStale),
                total_records = ?report.total_records,
                active_records = ?report.active_records,
                "Trend maintenance pass finished"
            );
        } else {
            warn!(
                event = "job_finished",
                job_name = "trend_maintenance",
                duration_ms = report.duration_ms,
                "Trend maintenance pass finished with failed steps"
            );
        }

        Ok(report)
    }

    async fn run_step(&self, step: MaintenanceStep, now: DateTime<Utc>) -> StepReport {
        let start = Instant::now();
        let config = &self.config;

        let work = async {
            match step {
                MaintenanceStep::ResetDaily => {
                    self.store.reset_daily(now, config.daily_window()).await
                }
                MaintenanceStep::ResetWeekly => {
                    self.store.reset_weekly(now, config.weekly_window()).await
                }
                MaintenanceStep::EvictStale => {
                    self.store
                        .evict_stale(now, config.stale_after(), config.evict_below_count)
                        .await
                }
            }
        };

        let (status, rows_affected, error_message) =
            match tokio::time::timeout(config.step_timeout(), work).await {
                Ok(Ok(rows)) => {
                    metrics::counter!("search_trends_maintenance_rows_total", "step" => step.as_str())
                        .increment(rows);
                    info!(step = %step, rows, "Maintenance step completed");
                    (StepStatus::Completed, rows, None)
                }
                Ok(Err(e)) => {
                    metrics::counter!("search_trends_maintenance_step_failures_total", "step" => step.as_str())
                        .increment(1);
                    error!(event = "job_failed", step = %step, error = %e, "Maintenance step failed");
                    (StepStatus::Failed, 0, Some(e.to_string()))
                }
                Err(_) => {
                    metrics::counter!("search_trends_maintenance_step_failures_total", "step" => step.as_str())
                        .increment(1);
                    warn!(
                        step = %step,
                        timeout_secs = config.step_timeout_seconds,
                        "Maintenance step timed out, moving on"
                    );
                    (
                        StepStatus::TimedOut,
                        0,
                        Some(format!(
                            "timed out after {}s",
                            config.step_timeout_seconds
                        )),
                    )
                }
            };

        StepReport {
            step,
            status,
            rows_affected,
            duration_ms: elapsed_ms(start),
            error: error_message,
        }
    }

    async fn bounded<F>(what: &str, limit: Duration, fut: F) -> Option<u64>
    where
        F: Future<Output = anyhow::Result<u64>>,
    {
        match tokio::time::timeout(limit, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(what, error = %e, "Maintenance report query failed");
                None
            }
            Err(_) => {
                warn!(what, "Maintenance report query timed out");
                None
            }
        }
    }
}
