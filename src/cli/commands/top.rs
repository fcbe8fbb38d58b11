use crate::services::TrendDirection;
use crate::state::SharedState;

pub async fn cmd_top(state: &SharedState, limit: Option<u64>) -> anyhow::Result<()> {
    let limit = state.config.trends.clamp_limit(limit);
    let items = state.trend_service.top_trending(limit).await?;

    if items.is_empty() {
        println!("No trending searches yet.");
        return Ok(());
    }

    println!("Trending searches (top {}):", items.len());
    println!("{:-<60}", "");

    for (i, item) in items.iter().enumerate() {
        let arrow = match item.trend {
            TrendDirection::Up => "▲",
            TrendDirection::Down => "▼",
            TrendDirection::Stable => "=",
        };
        println!(
            "{:>3}. {:<32} {:>6} {} {:>3}% ({})",
            i + 1,
            item.query,
            item.count,
            arrow,
            item.trend_percentage,
            item.window
        );
    }

    Ok(())
}
