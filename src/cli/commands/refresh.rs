use anyhow::Result;
use chrono::NaiveDate;
use compute::default_materializer;
use tracing::{error, info, trace};

use crate::config::initialize_app_state_with_url;

/// Run the schedule materializer once and print its report as JSON
pub async fn refresh_schedules(database_url: &str, today: Option<NaiveDate>) -> Result<()> {
    trace!("Entering refresh_schedules function");
    let state = initialize_app_state_with_url(database_url).await?;

    let report = default_materializer(state.settings.schedule, today)
        .generate_schedules_for_all_active_members(&state.db)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_complete() {
        error!("{}", report.summary());
        anyhow::bail!("{} schedule batches failed", report.failed_batches.len());
    }
    info!("{}", report.summary());
    Ok(())
}
