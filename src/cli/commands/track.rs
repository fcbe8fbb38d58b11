use crate::services::TrackOutcome;
use crate::state::SharedState;

pub async fn cmd_track(state: &SharedState, query: &str) -> anyhow::Result<()> {
    match state.trend_service.record(query).await? {
        TrackOutcome::Recorded(key) => println!("Recorded search for '{key}'"),
        TrackOutcome::Rejected => println!(
            "Ignored: query must be at least {} characters",
            state.config.trends.min_query_length
        ),
    }

    Ok(())
}
