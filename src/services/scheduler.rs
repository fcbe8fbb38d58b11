use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;
use crate::services::trend_service::TrendError;
use crate::state::SharedState;

pub type SchedulerState = Arc<SharedState>;

pub struct Scheduler {
    state: SchedulerState,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(state: SchedulerState, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let state = Arc::clone(&state);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                run_maintenance(&state).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Trend maintenance scheduled with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_hours = self.config.maintenance_interval_hours.max(1);

        info!("Trend maintenance running every {}h", interval_hours);

        let mut maintenance_interval =
            interval(Duration::from_secs(u64::from(interval_hours) * 60 * 60));

        loop {
            maintenance_interval.tick().await;
            if !*self.running.read().await {
                break;
            }
            run_maintenance(&self.state).await;
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }
}

async fn run_maintenance(state: &SharedState) {
    let start = std::time::Instant::now();
    let now = state.clock.now();

    match state.trend_service.run_maintenance_pass(now).await {
        Ok(report) => {
            info!(
                event = "job_finished",
                job_name = "scheduled_maintenance",
                duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                success = report.is_success(),
                "Scheduled maintenance finished"
            );
        }
        Err(TrendError::MaintenanceInProgress) => {
            warn!(
                job_name = "scheduled_maintenance",
                "Previous maintenance pass still running, skipping this trigger"
            );
        }
        Err(e) => {
            error!(event = "job_failed", job_name = "scheduled_maintenance", error = %e, "Scheduled maintenance failed");
        }
    }
}
