use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::join_all;
use sea_orm::ConnectionTrait;
use search_trends::config::Config;
use search_trends::db::Store;
use search_trends::models::TrendWindow;
use search_trends::services::{
    ManualClock, MaintenanceStep, SeaOrmTrendService, StepStatus, TrackOutcome, TrendDirection,
    TrendError, TrendService,
};
use search_trends::state::SharedState;
use std::sync::Arc;

fn temp_db_url() -> String {
    let path = std::env::temp_dir().join(format!("search-trends-{}.db", uuid::Uuid::new_v4()));
    format!("sqlite:{}?mode=rwc", path.display())
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = temp_db_url();
    config.trends.track_timeout_ms = 10_000;
    config.trends.cache_ttl_seconds = 0;
    config.scheduler.enabled = false;
    config.server.enabled = false;
    config
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
}

async fn setup_with(config: Config) -> (SharedState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(base_time()));
    let state = SharedState::with_clock(config, clock.clone())
        .await
        .expect("Failed to create state");
    (state, clock)
}

async fn setup() -> (SharedState, Arc<ManualClock>) {
    setup_with(test_config()).await
}

async fn record_times(service: &dyn TrendService, query: &str, times: usize) {
    for _ in 0..times {
        service.record(query).await.unwrap();
    }
}

#[tokio::test]
async fn test_concurrent_increments_are_not_lost() {
    let (state, _clock) = setup().await;
    let service = state.trend_service.clone();

    let tasks = (0..50).map(|_| {
        let service = service.clone();
        async move { service.record("voiture").await }
    });
    let results = join_all(tasks).await;
    assert!(results.iter().all(Result::is_ok));

    let record = service.lookup("voiture").await.unwrap().unwrap();
    assert_eq!(record.search_count, 50);
    assert_eq!(record.daily_count, 50);
    assert_eq!(record.weekly_count, 50);
    assert_eq!(state.store.count_trends().await.unwrap(), 1);
}

#[tokio::test]
async fn test_query_variants_share_one_record() {
    let (state, _clock) = setup().await;
    let service = &state.trend_service;

    for raw in ["  Voiture ", "VOITURE", "voiture", "\tvoiture\n"] {
        let outcome = service.record(raw).await.unwrap();
        assert_eq!(outcome, TrackOutcome::Recorded("voiture".to_string()));
    }

    let record = service.lookup("Voiture").await.unwrap().unwrap();
    assert_eq!(record.search_count, 4);
    assert_eq!(state.store.count_trends().await.unwrap(), 1);
}

#[tokio::test]
async fn test_short_queries_are_rejected_without_a_write() {
    let (state, _clock) = setup().await;
    let service = &state.trend_service;

    assert_eq!(service.record("a").await.unwrap(), TrackOutcome::Rejected);
    assert_eq!(service.record("   ").await.unwrap(), TrackOutcome::Rejected);
    assert_eq!(service.record(" b ").await.unwrap(), TrackOutcome::Rejected);
    assert_eq!(service.record("").await.unwrap(), TrackOutcome::Rejected);

    assert_eq!(state.store.count_trends().await.unwrap(), 0);
}

#[tokio::test]
async fn test_track_counts_in_background() {
    let config = test_config();
    let clock = Arc::new(ManualClock::new(base_time()));
    let store = Store::new(&config.general.database_path)
        .await
        .unwrap();
    let service = SeaOrmTrendService::new(store.clone(), config.trends.clone(), clock);

    let handle = service.tracker().track("Maison").expect("task spawned");
    handle.await.unwrap();

    assert!(service.tracker().track("x").is_none());

    let record = store.find_trend("maison").await.unwrap().unwrap();
    assert_eq!(record.search_count, 1);
    assert_eq!(record.last_searched, base_time());
    assert_eq!(record.created_at, base_time());
}

#[tokio::test]
async fn test_daily_and_weekly_windows_reset_independently() {
    let (state, clock) = setup().await;
    let service = &state.trend_service;
    let now = base_time();

    clock.set(now - Duration::hours(25));
    service.record("older than a day").await.unwrap();

    clock.set(now - Duration::hours(1));
    service.record("within the day").await.unwrap();

    clock.set(now - Duration::days(8));
    service.record("older than a week").await.unwrap();

    clock.set(now);
    let report = service.run_maintenance_pass(now).await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.rows(MaintenanceStep::ResetDaily), 2);
    assert_eq!(report.rows(MaintenanceStep::ResetWeekly), 1);
    assert_eq!(report.rows(MaintenanceStep::EvictStale), 0);

    let day_old = service.lookup("older than a day").await.unwrap().unwrap();
    assert_eq!(day_old.daily_count, 0);
    assert_eq!(day_old.weekly_count, 1);
    assert_eq!(day_old.search_count, 1);

    let fresh = service.lookup("within the day").await.unwrap().unwrap();
    assert_eq!(fresh.daily_count, 1);
    assert_eq!(fresh.weekly_count, 1);

    let week_old = service.lookup("older than a week").await.unwrap().unwrap();
    assert_eq!(week_old.daily_count, 0);
    assert_eq!(week_old.weekly_count, 0);
    assert_eq!(week_old.search_count, 1);
}

#[tokio::test]
async fn test_eviction_requires_both_stale_and_low_count() {
    let (state, clock) = setup().await;
    let service = &state.trend_service;
    let now = base_time();

    clock.set(now - Duration::days(31));
    record_times(service.as_ref(), "cold and rare", 2).await;
    record_times(service.as_ref(), "cold but popular", 3).await;

    clock.set(now - Duration::days(29));
    record_times(service.as_ref(), "recent and rare", 2).await;

    clock.set(now);
    let report = service.run_maintenance_pass(now).await.unwrap();
    assert_eq!(report.rows(MaintenanceStep::EvictStale), 1);
    assert_eq!(report.total_records, Some(2));

    assert!(service.lookup("cold and rare").await.unwrap().is_none());
    assert!(service.lookup("cold but popular").await.unwrap().is_some());
    assert!(service.lookup("recent and rare").await.unwrap().is_some());
}

#[tokio::test]
async fn test_maintenance_is_idempotent_for_the_same_instant() {
    let (state, clock) = setup().await;
    let service = &state.trend_service;
    let now = base_time();

    clock.set(now - Duration::days(2));
    record_times(service.as_ref(), "velo", 4).await;
    clock.set(now - Duration::days(40));
    record_times(service.as_ref(), "trottinette", 1).await;
    clock.set(now);

    let first = service.run_maintenance_pass(now).await.unwrap();
    assert!(first.rows(MaintenanceStep::ResetDaily) > 0);

    let before = service.lookup("velo").await.unwrap().unwrap();
    let second = service.run_maintenance_pass(now).await.unwrap();
    let after = service.lookup("velo").await.unwrap().unwrap();

    assert!(second.is_success());
    for step in MaintenanceStep::ALL {
        assert_eq!(second.rows(step), 0, "{step} touched rows on the second pass");
    }
    assert_eq!(before, after);
    assert_eq!(first.total_records, second.total_records);
}

#[tokio::test]
async fn test_overlapping_maintenance_is_refused() {
    let (state, _clock) = setup().await;
    let service = &state.trend_service;
    record_times(service.as_ref(), "voiture", 3).await;

    let now = base_time();
    let (a, b) = tokio::join!(
        service.run_maintenance_pass(now),
        service.run_maintenance_pass(now)
    );

    let refused = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(TrendError::MaintenanceInProgress)))
        .count();
    assert_eq!(refused, 1);
    assert!(a.is_ok() || b.is_ok());
}

#[tokio::test]
async fn test_surging_query_is_trending_up() {
    let (state, clock) = setup().await;
    let service = &state.trend_service;
    let now = base_time();

    clock.set(now - Duration::days(3));
    record_times(service.as_ref(), "voiture", 5).await;

    service.run_maintenance_pass(now).await.unwrap();

    clock.set(now);
    record_times(service.as_ref(), "voiture", 10).await;

    let record = service.lookup("voiture").await.unwrap().unwrap();
    assert_eq!(record.daily_count, 10);
    assert_eq!(record.weekly_count, 15);
    assert_eq!(record.search_count, 15);

    let top = service.top_trending(1).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].query, "voiture");
    assert_eq!(top[0].count, 10);
    assert_eq!(top[0].trend, TrendDirection::Up);
    assert_eq!(top[0].trend_percentage, 67);
    assert_eq!(top[0].window, TrendWindow::Daily);
}

#[tokio::test]
async fn test_trending_falls_back_to_weekly_counts() {
    let (state, clock) = setup().await;
    let service = &state.trend_service;
    let now = base_time();

    clock.set(now - Duration::days(2));
    record_times(service.as_ref(), "maison", 6).await;
    record_times(service.as_ref(), "jardin", 2).await;
    service.run_maintenance_pass(now).await.unwrap();

    clock.set(now);
    record_times(service.as_ref(), "piscine", 1).await;

    let top = service.top_trending(3).await.unwrap();
    let queries: Vec<_> = top.iter().map(|t| t.query.as_str()).collect();
    assert_eq!(queries, vec!["piscine", "maison", "jardin"]);

    assert_eq!(top[0].window, TrendWindow::Daily);
    assert_eq!(top[0].trend, TrendDirection::Up);
    assert_eq!(top[1].window, TrendWindow::Weekly);
    assert_eq!(top[1].count, 6);
    assert_eq!(top[1].trend, TrendDirection::Down);
    assert_eq!(top[1].trend_percentage, 0);
}

#[tokio::test]
async fn test_trending_limit_and_empty_store() {
    let (state, _clock) = setup().await;
    let service = &state.trend_service;

    assert!(service.top_trending(10).await.unwrap().is_empty());

    record_times(service.as_ref(), "alpha", 3).await;
    record_times(service.as_ref(), "bravo", 2).await;
    record_times(service.as_ref(), "charlie", 1).await;

    assert!(service.top_trending(0).await.unwrap().is_empty());

    let top = service.top_trending(2).await.unwrap();
    let queries: Vec<_> = top.iter().map(|t| t.query.as_str()).collect();
    assert_eq!(queries, vec!["alpha", "bravo"]);
}

#[tokio::test]
async fn test_trending_cache_is_invalidated_by_maintenance() {
    let mut config = test_config();
    config.trends.cache_ttl_seconds = 300;
    let (state, _clock) = setup_with(config).await;
    let service = &state.trend_service;

    record_times(service.as_ref(), "voiture", 2).await;
    assert_eq!(service.top_trending(5).await.unwrap()[0].count, 2);

    service.record("voiture").await.unwrap();
    assert_eq!(service.top_trending(5).await.unwrap()[0].count, 2);

    service.run_maintenance_pass(base_time()).await.unwrap();
    assert_eq!(service.top_trending(5).await.unwrap()[0].count, 3);
}

#[tokio::test]
async fn test_stats_count_active_records() {
    let (state, clock) = setup().await;
    let service = &state.trend_service;
    let now = base_time();

    clock.set(now - Duration::days(10));
    service.record("ancien").await.unwrap();
    clock.set(now - Duration::days(3));
    service.record("semaine").await.unwrap();
    clock.set(now - Duration::hours(2));
    service.record("aujourd'hui").await.unwrap();
    clock.set(now);

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.active_daily, 1);
    assert_eq!(stats.active_weekly, 2);
}

#[tokio::test]
async fn test_lookup_rejects_short_queries() {
    let (state, _clock) = setup().await;

    let result = state.trend_service.lookup(" x ").await;
    assert!(matches!(result, Err(TrendError::Validation(_))));
    assert!(state.trend_service.lookup("unknown").await.unwrap().is_none());
}

async fn standalone_service() -> (SeaOrmTrendService, Store) {
    let config = test_config();
    let store = Store::new(&config.general.database_path).await.unwrap();
    let clock = Arc::new(ManualClock::new(base_time()));
    let service = SeaOrmTrendService::new(store.clone(), config.trends, clock);
    (service, store)
}

#[tokio::test]
async fn test_concurrent_background_tracks_are_not_lost() {
    let (service, store) = standalone_service().await;

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let raw = if i % 2 == 0 { "Voiture" } else { "  voiture " };
            service.tracker().track(raw).expect("task spawned")
        })
        .collect();

    let results = join_all(handles).await;
    assert!(results.iter().all(Result::is_ok));

    let record = store.find_trend("voiture").await.unwrap().unwrap();
    assert_eq!(record.search_count, 50);
    assert_eq!(record.daily_count, 50);
    assert_eq!(record.weekly_count, 50);
}

#[tokio::test]
async fn test_store_failures_are_reported_per_step_and_swallowed_by_track() {
    let (service, store) = standalone_service().await;
    service.record("voiture").await.unwrap();

    store
        .conn
        .execute_unprepared("DROP TABLE search_trends")
        .await
        .unwrap();

    let report = service.run_maintenance_pass(base_time()).await.unwrap();
    assert!(!report.is_success());
    assert_eq!(report.steps.len(), 3);
    for step in MaintenanceStep::ALL {
        let step_report = report.step(step).unwrap();
        assert_eq!(step_report.status, StepStatus::Failed, "{step}");
        assert_eq!(step_report.rows_affected, 0);
        assert!(step_report.error.is_some());
    }
    assert_eq!(report.total_records, None);
    assert_eq!(report.active_records, None);

    // The background task absorbs the error instead of panicking.
    let handle = service.tracker().track("voiture").expect("task spawned");
    assert!(handle.await.is_ok());
    service.track("maison");

    assert!(matches!(
        service.record("voiture").await,
        Err(TrendError::Database(_))
    ));
    assert!(matches!(
        service.top_trending(5).await,
        Err(TrendError::Database(_))
    ));
}

#[tokio::test]
async fn test_increment_over_budget_reports_timeout() {
    let mut config = test_config();
    config.trends.track_timeout_ms = 0;
    let (state, _clock) = setup_with(config).await;

    let result = state.trend_service.record("voiture").await;
    assert!(matches!(result, Err(TrendError::Timeout(0))));
}
