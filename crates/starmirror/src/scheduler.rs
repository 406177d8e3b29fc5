//! Daily scheduled sync runs.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::sync::SyncCoordinator;

/// Local time of day the daily run fires when nothing else is configured.
pub const DEFAULT_SCHEDULE_TIME: &str = "02:00";

/// How long to wait before looking for the schedule time again when today
/// and the next days have no valid local occurrence.
const RETRY_LOOKUP_AFTER: Duration = Duration::from_secs(3600);

/// Parse an `HH:MM` time of day.
pub fn parse_schedule_time(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
}

/// The first instant strictly after `now` whose local time is `at`.
///
/// A day on which `at` does not exist locally (DST gap) is skipped.
pub fn next_occurrence<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    for _ in 0..3 {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(at)).earliest()
            && candidate > *now
        {
            return Some(candidate);
        }
        date = date.succ_opt()?;
    }
    None
}

/// Spawn a task that triggers a scheduled run every day at local time `at`.
///
/// Each firing waits for its run before computing the next one. A collision
/// with a manual run is skipped by the coordinator.
///
/// The task stops once `shutdown` turns `true` (or its sender is dropped).
/// A run that is already in progress is awaited first, so the returned handle
/// completes only after it is recorded.
pub fn spawn_daily(
    coordinator: SyncCoordinator,
    at: NaiveTime,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while !*shutdown.borrow() {
            let now = Local::now();
            let delay = match next_occurrence(&now, at) {
                Some(next) => {
                    tracing::info!(next_run = %next, "Next scheduled sync");
                    Some((next - now).to_std().unwrap_or_default())
                }
                None => {
                    tracing::warn!(%at, "No upcoming local occurrence of schedule time, retrying in an hour");
                    None
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay.unwrap_or(RETRY_LOOKUP_AFTER)) => {
                    if delay.is_none() {
                        continue;
                    }
                }
                _ = shutdown.changed() => break,
            }

            let Some(handle) = coordinator.trigger_scheduled() else {
                continue;
            };
            match handle.wait().await {
                Ok(run) => tracing::info!(
                    run_id = %run.id,
                    status = %run.status,
                    synced = run.synced_count,
                    deleted = run.deleted_count,
                    "Scheduled sync finished"
                ),
                Err(e) => tracing::error!(error = %e, "Scheduled sync could not be recorded"),
            }
        }
        tracing::debug!("Daily schedule stopped");
    })
}
