use starmirror::sync::SyncProgress;

/// Logging reporter using tracing for structured output.
pub(crate) struct LoggingReporter;

impl LoggingReporter {
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::RunStarted { run_id, kind } => {
                tracing::info!(%run_id, %kind, "Sync run started");
            }

            SyncProgress::FetchingStarred { username } => {
                tracing::info!(username = %username, "Fetching starred repositories");
            }

            SyncProgress::FetchedPage {
                page,
                count,
                total_so_far,
            } => {
                tracing::debug!(page, count, total_so_far, "Fetched page");
            }

            SyncProgress::PageFetchRetry {
                page,
                retry_after_ms,
                attempt,
            } => {
                tracing::warn!(page, retry_after_ms, attempt, "Page fetch failed, backing off");
            }

            SyncProgress::FetchComplete { total, partial } => {
                if partial {
                    tracing::warn!(total, "Fetch stopped early");
                } else {
                    tracing::info!(total, "Fetch complete");
                }
            }

            SyncProgress::Reconciling { remote, local } => {
                tracing::debug!(remote, local, "Reconciling");
            }

            SyncProgress::Reconciled {
                inserted,
                updated,
                deleted,
                deletions_skipped,
            } => {
                tracing::info!(inserted, updated, deleted, deletions_skipped, "Reconciled");
            }

            SyncProgress::RunFinished {
                run_id,
                status,
                error,
            } => match error {
                Some(error) => tracing::error!(%run_id, %status, error = %error, "Sync run finished"),
                None => tracing::info!(%run_id, %status, "Sync run finished"),
            },

            SyncProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
