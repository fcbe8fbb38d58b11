use crate::models::{TrendRecord, TrendWindow};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::trends::TrendRepository;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(std::time::Duration::from_secs(10))
            .acquire_timeout(std::time::Duration::from_secs(10))
            .idle_timeout(std::time::Duration::from_secs(300))
            .max_lifetime(std::time::Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn trend_repo(&self) -> TrendRepository {
        TrendRepository::new(self.conn.clone())
    }

    pub async fn upsert_increment(&self, query: &str, now: DateTime<Utc>) -> Result<()> {
        self.trend_repo().upsert_increment(query, now).await
    }

    pub async fn reset_daily(&self, now: DateTime<Utc>, threshold: Duration) -> Result<u64> {
        self.trend_repo().reset_daily(now, threshold).await
    }

    pub async fn reset_weekly(&self, now: DateTime<Utc>, threshold: Duration) -> Result<u64> {
        self.trend_repo().reset_weekly(now, threshold).await
    }

    pub async fn evict_stale(
        &self,
        now: DateTime<Utc>,
        stale_after: Duration,
        count_below: i64,
    ) -> Result<u64> {
        self.trend_repo()
            .evict_stale(now, stale_after, count_below)
            .await
    }

    pub async fn top_by_window(&self, window: TrendWindow, limit: u64) -> Result<Vec<TrendRecord>> {
        self.trend_repo().top_by_window(window, limit).await
    }

    pub async fn find_trend(&self, query: &str) -> Result<Option<TrendRecord>> {
        self.trend_repo().find(query).await
    }

    pub async fn count_trends(&self) -> Result<u64> {
        self.trend_repo().count().await
    }

    pub async fn count_active_since(&self, now: DateTime<Utc>, window: Duration) -> Result<u64> {
        self.trend_repo().count_active_since(now, window).await
    }
}
