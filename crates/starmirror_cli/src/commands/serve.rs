use std::sync::Arc;

use starmirror::connect_and_migrate;
use starmirror::scheduler::{parse_schedule_time, spawn_daily};
use tokio::sync::watch;

use crate::commands::shared::build_coordinator;
use crate::config::Config;
use crate::progress::ProgressReporter;
use crate::shutdown::wait_for_shutdown;

/// Run the daily scheduler until Ctrl+C.
///
/// `at` overrides the configured schedule time. With `run_now` a manual run
/// is triggered at startup. On shutdown, runs in flight are awaited.
pub(crate) async fn handle_serve(
    config: &Config,
    database_url: &str,
    at: Option<&str>,
    run_now: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let at_value = at.unwrap_or(&config.sync.schedule_time);
    let at = parse_schedule_time(at_value)
        .map_err(|e| format!("invalid schedule time '{at_value}' (expected HH:MM): {e}"))?;

    let db = connect_and_migrate(database_url).await?;
    let reporter = Arc::new(ProgressReporter::logging());
    let coordinator = build_coordinator(config, db, Some(reporter.as_callback()))?;

    tracing::info!(%at, "Daily sync scheduled");
    let (stop_tx, stop_rx) = watch::channel(false);
    let schedule = spawn_daily(coordinator.clone(), at, stop_rx);

    let startup_run = if run_now {
        Some(coordinator.trigger_manual()?)
    } else {
        None
    };

    wait_for_shutdown().await;
    stop_tx.send_replace(true);

    if coordinator.is_syncing() {
        tracing::info!("Waiting for the running sync to finish");
    }
    if let Some(handle) = startup_run
        && let Err(e) = handle.wait().await
    {
        tracing::error!(error = %e, "Startup sync could not be recorded");
    }
    if let Err(e) = schedule.await {
        tracing::error!(error = %e, "Scheduler task ended abnormally");
    }

    tracing::info!("Scheduler stopped");
    Ok(())
}
