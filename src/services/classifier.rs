//! Trend classification for the "trending searches" surface.
//!
//! A query's recent share is the fraction of its weekly activity that
//! happened in the daily window. The share is compared against the share a
//! query would have if its searches were spread evenly across the week.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::ClassifierConfig;
use crate::models::{TrendRecord, TrendWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One display-ready row of the trending list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingQuery {
    pub query: String,

    /// Counter of the window the row was ranked by.
    pub count: i64,

    pub trend: TrendDirection,

    /// `round(recent share * 100)`, clamped to `0..=100`.
    pub trend_percentage: u8,

    /// Window the row was ranked by. Not part of the serialized row.
    #[serde(skip)]
    pub window: TrendWindow,
}

#[derive(Debug, Clone, Default)]
pub struct TrendClassifier {
    config: ClassifierConfig,
}

impl TrendClassifier {
    #[must_use]
    pub const fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn recent_share(daily_count: i64, weekly_count: i64) -> f64 {
        daily_count.max(0) as f64 / weekly_count.max(1) as f64
    }

    #[must_use]
    pub fn classify(&self, recent_share: f64) -> TrendDirection {
        let baseline = self.config.baseline_share;

        if recent_share > baseline * self.config.up_factor {
            TrendDirection::Up
        } else if recent_share < baseline * self.config.down_factor {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percentage(recent_share: f64) -> u8 {
        if recent_share.is_nan() {
            return 0;
        }
        (recent_share * 100.0).round().clamp(0.0, 100.0) as u8
    }

    #[must_use]
    pub fn describe(&self, record: &TrendRecord, window: TrendWindow) -> TrendingQuery {
        let share = Self::recent_share(record.daily_count, record.weekly_count);

        TrendingQuery {
            query: record.query.clone(),
            count: record.window_count(window),
            trend: self.classify(share),
            trend_percentage: Self::percentage(share),
            window,
        }
    }

    /// Builds the trending list from the daily ranking, topping it up from
    /// the weekly ranking when fewer than `limit` queries were searched today.
    ///
    /// Both inputs are expected in ranking order. Weekly rows already present
    /// in the daily ranking are skipped.
    #[must_use]
    pub fn rank(
        &self,
        daily: &[TrendRecord],
        weekly: &[TrendRecord],
        limit: usize,
    ) -> Vec<TrendingQuery> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ranked = Vec::with_capacity(limit);

        for record in daily.iter().filter(|r| r.daily_count > 0) {
            if ranked.len() >= limit {
                return ranked;
            }
            if seen.insert(record.query.as_str()) {
                ranked.push(self.describe(record, TrendWindow::Daily));
            }
        }

        for record in weekly.iter().filter(|r| r.weekly_count > 0) {
            if ranked.len() >= limit {
                break;
            }
            if seen.insert(record.query.as_str()) {
                ranked.push(self.describe(record, TrendWindow::Weekly));
            }
        }

        ranked
    }
}
