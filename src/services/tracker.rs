use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::db::Store;
use crate::services::clock::Clock;
use crate::services::normalizer::QueryNormalizer;
use crate::services::trend_service::TrendError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// The search was counted under this normalized key.
    Recorded(String),

    /// The query normalized to something too short to be worth counting.
    Rejected,
}

/// Ingests search occurrences into the trend store.
#[derive(Clone)]
pub struct TrendTracker {
    store: Store,
    clock: Arc<dyn Clock>,
    normalizer: QueryNormalizer,
    timeout: Duration,
}

impl TrendTracker {
    #[must_use]
    pub fn new(
        store: Store,
        clock: Arc<dyn Clock>,
        normalizer: QueryNormalizer,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            normalizer,
            timeout,
        }
    }

    fn normalize(&self, raw_query: &str) -> Option<String> {
        let normalized = self.normalizer.normalize(raw_query);
        if normalized.is_none() {
            metrics::counter!("search_trends_rejected_total").increment(1);
            debug!(raw_len = raw_query.len(), "Ignoring search query below minimum length");
        }
        normalized
    }

    /// Counts one search without making the caller wait.
    ///
    /// Rejected queries never reach the runtime, so no task is spawned for
    /// them. Store failures and timeouts are logged and dropped.
    pub fn track(&self, raw_query: &str) -> Option<JoinHandle<()>> {
        let query = self.normalize(raw_query)?;
        let tracker = self.clone();

        Some(tokio::spawn(async move {
            if let Err(e) = tracker.increment(&query).await {
                let reason = match &e {
                    TrendError::Timeout(_) => "abandoned",
                    _ => "store",
                };
                metrics::counter!("search_trends_track_failures_total", "reason" => reason)
                    .increment(1);
                warn!(query = %query, error = %e, "Failed to record search");
            }
        }))
    }

    /// Counts one search and reports what happened.
    pub async fn record(&self, raw_query: &str) -> Result<TrackOutcome, TrendError> {
        let Some(query) = self.normalize(raw_query) else {
            return Ok(TrackOutcome::Rejected);
        };

        self.increment(&query).await?;
        Ok(TrackOutcome::Recorded(query))
    }

    /// Applies one increment within the tracking budget.
    ///
    /// On timeout the statement is abandoned, not cancelled: the database
    /// may still commit it after `Timeout` is returned.
    async fn increment(&self, query: &str) -> Result<(), TrendError> {
        let now = self.clock.now();

        match tokio::time::timeout(self.timeout, self.store.upsert_increment(query, now)).await {
            Ok(Ok(())) => {
                metrics::counter!("search_trends_tracked_total").increment(1);
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(TrendError::Timeout(
                u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }
}
