use crate::services::StepStatus;
use crate::state::SharedState;

pub async fn cmd_maintain(state: &SharedState) -> anyhow::Result<()> {
    let now = state.clock.now();
    let report = state.trend_service.run_maintenance_pass(now).await?;

    println!("Maintenance pass at {}", report.ran_at);
    for step in &report.steps {
        match step.status {
            StepStatus::Completed => {
                println!("  ✓ {:<14} {} rows", step.step, step.rows_affected);
            }
            StepStatus::Failed | StepStatus::TimedOut => println!(
                "  ✗ {:<14} {}",
                step.step,
                step.error.as_deref().unwrap_or("failed")
            ),
        }
    }

    if let Some(total) = report.total_records {
        println!("  Records remaining: {total}");
    }

    if !report.is_success() {
        anyhow::bail!("Maintenance pass finished with failed steps");
    }

    Ok(())
}
