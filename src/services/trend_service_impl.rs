//! `SeaORM` implementation of the `TrendService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::TrendConfig;
use crate::db::Store;
use crate::models::{TrendRecord, TrendStats, TrendWindow};
use crate::services::classifier::{TrendClassifier, TrendingQuery};
use crate::services::clock::Clock;
use crate::services::maintenance::{MaintenanceJob, MaintenanceReport};
use crate::services::normalizer::QueryNormalizer;
use crate::services::tracker::{TrackOutcome, TrendTracker};
use crate::services::trend_service::{TrendError, TrendService};

struct CachedTrending {
    fetched_at: Instant,
    items: Vec<TrendingQuery>,
}

pub struct SeaOrmTrendService {
    store: Store,
    config: TrendConfig,
    clock: Arc<dyn Clock>,
    normalizer: QueryNormalizer,
    tracker: TrendTracker,
    classifier: TrendClassifier,
    maintenance: MaintenanceJob,
    cache: RwLock<HashMap<u64, CachedTrending>>,
}

impl SeaOrmTrendService {
    #[must_use]
    pub fn new(store: Store, config: TrendConfig, clock: Arc<dyn Clock>) -> Self {
        let normalizer = QueryNormalizer::new(config.min_query_length);
        let tracker = TrendTracker::new(
            store.clone(),
            clock.clone(),
            normalizer,
            config.track_timeout(),
        );
        let classifier = TrendClassifier::new(config.classifier.clone());
        let maintenance = MaintenanceJob::new(store.clone(), config.clone());

        Self {
            store,
            config,
            clock,
            normalizer,
            tracker,
            classifier,
            maintenance,
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn tracker(&self) -> &TrendTracker {
        &self.tracker
    }

    const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache_ttl_seconds)
    }

    async fn cached(&self, limit: u64) -> Option<Vec<TrendingQuery>> {
        if self.config.cache_ttl_seconds == 0 {
            return None;
        }

        let cache = self.cache.read().await;
        cache
            .get(&limit)
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl())
            .map(|entry| entry.items.clone())
    }

    async fn invalidate_cache(&self) {
        self.cache.write().await.clear();
    }
}

#[async_trait]
impl TrendService for SeaOrmTrendService {
    fn track(&self, raw_query: &str) {
        // Detached on purpose; the task logs its own failures.
        drop(self.tracker.track(raw_query));
    }

    async fn record(&self, raw_query: &str) -> Result<TrackOutcome, TrendError> {
        self.tracker.record(raw_query).await
    }

    async fn top_trending(&self, limit: u64) -> Result<Vec<TrendingQuery>, TrendError> {
        let limit = limit.min(self.config.max_limit);
        if limit == 0 {
            return Ok(Vec::new());
        }

        if let Some(items) = self.cached(limit).await {
            debug!(limit, "Serving trending list from cache");
            return Ok(items);
        }

        let daily = self.store.top_by_window(TrendWindow::Daily, limit).await?;

        let weekly = if u64::try_from(daily.len()).unwrap_or(u64::MAX) < limit {
            self.store.top_by_window(TrendWindow::Weekly, limit).await?
        } else {
            Vec::new()
        };

        let items = self.classifier.rank(
            &daily,
            &weekly,
            usize::try_from(limit).unwrap_or(usize::MAX),
        );

        if self.config.cache_ttl_seconds > 0 {
            self.cache.write().await.insert(
                limit,
                CachedTrending {
                    fetched_at: Instant::now(),
                    items: items.clone(),
                },
            );
        }

        Ok(items)
    }

    async fn run_maintenance_pass(
        &self,
        now: DateTime<Utc>,
    ) -> Result<MaintenanceReport, TrendError> {
        let report = self.maintenance.run(now).await?;
        self.invalidate_cache().await;
        Ok(report)
    }

    async fn stats(&self) -> Result<TrendStats, TrendError> {
        let now = self.clock.now();

        let total_records = self.store.count_trends().await?;
        let active_daily = self
            .store
            .count_active_since(now, self.config.daily_window())
            .await?;
        let active_weekly = self
            .store
            .count_active_since(now, self.config.weekly_window())
            .await?;

        Ok(TrendStats {
            total_records,
            active_daily,
            active_weekly,
        })
    }

    async fn lookup(&self, raw_query: &str) -> Result<Option<TrendRecord>, TrendError> {
        let Some(query) = self.normalizer.normalize(raw_query) else {
            return Err(TrendError::Validation(format!(
                "Query must be at least {} characters",
                self.config.min_query_length
            )));
        };

        Ok(self.store.find_trend(&query).await?)
    }
}
