use crate::state::SharedState;

pub async fn cmd_inspect(state: &SharedState, query: &str) -> anyhow::Result<()> {
    let Some(record) = state.trend_service.lookup(query).await? else {
        println!("No record for '{}'", query.trim());
        return Ok(());
    };

    println!("{}", record.query);
    println!("{:-<40}", "");
    println!("  Total:         {}", record.search_count);
    println!("  Daily:         {}", record.daily_count);
    println!("  Weekly:        {}", record.weekly_count);
    println!("  Last searched: {}", record.last_searched);
    println!("  First seen:    {}", record.created_at);

    Ok(())
}
