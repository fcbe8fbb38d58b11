//! Domain service for search-trend tracking.
//!
//! Exposes the two operations the rest of the application consumes
//! (recording a search, reading the trending list) plus the maintenance
//! entry point driven by the scheduler.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{TrendRecord, TrendStats};
use crate::services::classifier::TrendingQuery;
use crate::services::maintenance::MaintenanceReport;
use crate::services::tracker::TrackOutcome;

/// Errors specific to trend operations.
#[derive(Debug, Error)]
pub enum TrendError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("A maintenance pass is already running")]
    MaintenanceInProgress,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for TrendError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for TrendError {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<sea_orm::DbErr>().is_some() {
            Self::Database(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

/// Domain service trait for search trends.
#[async_trait]
pub trait TrendService: Send + Sync {
    /// Records a search in the background. Never fails and never waits on
    /// the store.
    fn track(&self, raw_query: &str);

    /// Records a search and waits for the store to acknowledge it.
    async fn record(&self, raw_query: &str) -> Result<TrackOutcome, TrendError>;

    /// Returns up to `limit` trending queries, classified.
    async fn top_trending(&self, limit: u64) -> Result<Vec<TrendingQuery>, TrendError>;

    /// Resets elapsed windows and evicts cold records as of `now`.
    async fn run_maintenance_pass(
        &self,
        now: DateTime<Utc>,
    ) -> Result<MaintenanceReport, TrendError>;

    async fn stats(&self) -> Result<TrendStats, TrendError>;

    /// Looks up the record a raw query would be counted under.
    async fn lookup(&self, raw_query: &str) -> Result<Option<TrendRecord>, TrendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_errors_convert_to_database_variant() {
        let err: TrendError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, TrendError::Database(_)));

        let wrapped = anyhow::Error::new(sea_orm::DbErr::Custom("boom".to_string()));
        let err: TrendError = wrapped.into();
        assert!(matches!(err, TrendError::Database(_)));
    }

    #[test]
    fn other_errors_convert_to_internal_variant() {
        let err: TrendError = anyhow::anyhow!("something else").into();
        assert!(matches!(err, TrendError::Internal(_)));
    }
}
