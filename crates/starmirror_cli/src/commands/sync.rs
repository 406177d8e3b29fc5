use std::sync::Arc;

use console::style;
use serde::Serialize;

use starmirror::sync::TriggerResponse;
use starmirror::{RunStatus, SyncRunModel, connect_and_migrate};

use crate::commands::output::{OutputFormat, RunDisplay, print_json, print_table};
use crate::commands::shared::build_coordinator;
use crate::config::Config;
use crate::progress::ProgressReporter;

#[derive(Serialize)]
struct SyncOutput<'a> {
    trigger: TriggerResponse,
    run: &'a SyncRunModel,
}

/// Run one manual sync and wait for it to finish.
///
/// Fails when the run is recorded as failed.
pub(crate) async fn handle_sync(
    config: &Config,
    database_url: &str,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = connect_and_migrate(database_url).await?;
    let reporter = Arc::new(match output {
        OutputFormat::Json => ProgressReporter::logging(),
        OutputFormat::Table => ProgressReporter::new(),
    });
    let coordinator = build_coordinator(config, db, Some(reporter.as_callback()))?;

    let triggered = coordinator.trigger_manual();
    let trigger = TriggerResponse::from_result(&triggered);
    let run = triggered?.wait().await?;
    reporter.finish();

    match output {
        OutputFormat::Json => print_json(&SyncOutput { trigger, run: &run })?,
        OutputFormat::Table => {
            print_table([RunDisplay::from(&run)]);
            let total = coordinator.status().await?.total_repos;
            let summary = format!("{total} starred repositories mirrored");
            if run.status == RunStatus::Succeeded {
                println!("{}", style(summary).green());
            } else {
                println!("{}", style(summary).yellow());
            }
        }
    }

    if run.status == RunStatus::Failed {
        let message = run.error_message.unwrap_or_else(|| "unknown error".to_string());
        return Err(format!("sync failed: {message}").into());
    }
    Ok(())
}
