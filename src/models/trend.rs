use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::search_trends;

/// Persisted counters for one normalized query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub query: String,

    /// Lifetime total. Only ever incremented.
    pub search_count: i64,

    pub daily_count: i64,

    pub weekly_count: i64,

    pub last_searched: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl From<search_trends::Model> for TrendRecord {
    fn from(m: search_trends::Model) -> Self {
        Self {
            query: m.query,
            search_count: m.search_count,
            daily_count: m.daily_count,
            weekly_count: m.weekly_count,
            last_searched: m.last_searched,
            created_at: m.created_at,
        }
    }
}

impl TrendRecord {
    #[must_use]
    pub const fn window_count(&self, window: TrendWindow) -> i64 {
        match window {
            TrendWindow::Daily => self.daily_count,
            TrendWindow::Weekly => self.weekly_count,
        }
    }
}

/// Which window counter a ranking is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendWindow {
    Daily,
    Weekly,
}

impl TrendWindow {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for TrendWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate view of the trend table used by reporting surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendStats {
    pub total_records: u64,
    pub active_daily: u64,
    pub active_weekly: u64,
}
