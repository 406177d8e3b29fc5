use starmirror::connect_and_migrate;
use starmirror::sync::SyncStatus;

use crate::commands::output::{OutputFormat, PropertyRow, print_json, print_table};
use crate::commands::shared::build_coordinator;
use crate::config::Config;

/// Show the coordinator status and store totals.
pub(crate) async fn handle_status(
    config: &Config,
    database_url: &str,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = connect_and_migrate(database_url).await?;
    let coordinator = build_coordinator(config, db, None)?;
    let status = coordinator.status().await?;

    match output {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Table => print_table(status_rows(&status)),
    }
    Ok(())
}

fn status_rows(status: &SyncStatus) -> Vec<PropertyRow> {
    let time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "never".to_string())
    };

    vec![
        PropertyRow::new("Syncing", status.syncing),
        PropertyRow::new("Phase", &status.phase),
        PropertyRow::new("Repositories", status.total_repos),
        PropertyRow::new("Last Sync (this process)", time(status.last_sync_time)),
        PropertyRow::new("Last Sync Count", status.last_sync_count),
        PropertyRow::new("Last Success", time(status.last_success_time)),
        PropertyRow::new(
            "Last Success Count",
            status
                .last_success_count
                .map_or_else(|| "-".to_string(), |c| c.to_string()),
        ),
    ]
}
