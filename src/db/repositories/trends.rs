use crate::entities::{prelude::*, search_trends};
use crate::models::{TrendRecord, TrendWindow};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// Repository for the `search_trends` table.
///
/// Every write is a single SQL statement so concurrent callers never
/// interleave a read and a write on the same row.
pub struct TrendRepository {
    conn: DatabaseConnection,
}

impl TrendRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    const fn window_column(window: TrendWindow) -> search_trends::Column {
        match window {
            TrendWindow::Daily => search_trends::Column::DailyCount,
            TrendWindow::Weekly => search_trends::Column::WeeklyCount,
        }
    }

    /// `INSERT ... ON CONFLICT(query) DO UPDATE` with column-relative increments.
    pub async fn upsert_increment(&self, query: &str, now: DateTime<Utc>) -> Result<()> {
        let active_model = search_trends::ActiveModel {
            query: Set(query.to_string()),
            search_count: Set(1),
            daily_count: Set(1),
            weekly_count: Set(1),
            last_searched: Set(now),
            created_at: Set(now),
            ..Default::default()
        };

        SearchTrends::insert(active_model)
            .on_conflict(
                OnConflict::column(search_trends::Column::Query)
                    .value(
                        search_trends::Column::SearchCount,
                        Expr::col(search_trends::Column::SearchCount).add(1),
                    )
                    .value(
                        search_trends::Column::DailyCount,
                        Expr::col(search_trends::Column::DailyCount).add(1),
                    )
                    .value(
                        search_trends::Column::WeeklyCount,
                        Expr::col(search_trends::Column::WeeklyCount).add(1),
                    )
                    .update_column(search_trends::Column::LastSearched)
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    /// Zeroes `window`'s counter on every record idle for longer than `threshold`.
    pub async fn reset_window(
        &self,
        window: TrendWindow,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Result<u64> {
        let column = Self::window_column(window);
        let cutoff = now - threshold;

        let result = SearchTrends::update_many()
            .col_expr(column, Expr::value(0_i64))
            .filter(search_trends::Column::LastSearched.lt(cutoff))
            .filter(column.gt(0))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn reset_daily(&self, now: DateTime<Utc>, threshold: Duration) -> Result<u64> {
        self.reset_window(TrendWindow::Daily, now, threshold).await
    }

    pub async fn reset_weekly(&self, now: DateTime<Utc>, threshold: Duration) -> Result<u64> {
        self.reset_window(TrendWindow::Weekly, now, threshold).await
    }

    pub async fn evict_stale(
        &self,
        now: DateTime<Utc>,
        stale_after: Duration,
        count_below: i64,
    ) -> Result<u64> {
        let cutoff = now - stale_after;

        let result = SearchTrends::delete_many()
            .filter(search_trends::Column::LastSearched.lt(cutoff))
            .filter(search_trends::Column::SearchCount.lt(count_below))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Highest counters first, most recently searched first on ties.
    /// Records whose window counter is zero are not ranked.
    pub async fn top_by_window(&self, window: TrendWindow, limit: u64) -> Result<Vec<TrendRecord>> {
        let column = Self::window_column(window);

        let rows = SearchTrends::find()
            .filter(column.gt(0))
            .order_by_desc(column)
            .order_by_desc(search_trends::Column::LastSearched)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(TrendRecord::from).collect())
    }

    pub async fn find(&self, query: &str) -> Result<Option<TrendRecord>> {
        let row = SearchTrends::find()
            .filter(search_trends::Column::Query.eq(query))
            .one(&self.conn)
            .await?;

        Ok(row.map(TrendRecord::from))
    }

    pub async fn count(&self) -> Result<u64> {
        let count = SearchTrends::find().count(&self.conn).await?;
        Ok(count)
    }

    pub async fn count_active_since(&self, now: DateTime<Utc>, window: Duration) -> Result<u64> {
        let since = now - window;

        let count = SearchTrends::find()
            .filter(search_trends::Column::LastSearched.gte(since))
            .count(&self.conn)
            .await?;

        Ok(count)
    }
}
