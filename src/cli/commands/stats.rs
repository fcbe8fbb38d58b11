use crate::state::SharedState;

pub async fn cmd_stats(state: &SharedState) -> anyhow::Result<()> {
    let stats = state.trend_service.stats().await?;

    println!("Trend records: {}", stats.total_records);
    println!(
        "  Searched in the last {}h: {}",
        state.config.trends.daily_window_hours, stats.active_daily
    );
    println!(
        "  Searched in the last {}d: {}",
        state.config.trends.weekly_window_days, stats.active_weekly
    );

    Ok(())
}
