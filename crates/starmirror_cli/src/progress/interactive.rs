use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use starmirror::RunStatus;
use starmirror::sync::SyncProgress;

/// Single spinner that follows one run through its phases.
pub(crate) struct InteractiveReporter {
    bar: ProgressBar,
}

impl InteractiveReporter {
    pub(crate) fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        bar.set_prefix("starmirror");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// A reporter that draws nowhere.
    #[cfg(test)]
    pub(crate) fn hidden() -> Self {
        let bar = ProgressBar::with_draw_target(None, indicatif::ProgressDrawTarget::hidden());
        bar.set_style(Self::spinner_style());
        Self { bar }
    }

    pub(crate) fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::RunStarted { kind, .. } => {
                self.bar.set_message(format!("Starting {kind} sync..."));
            }
            SyncProgress::FetchingStarred { username } => {
                self.bar
                    .set_message(format!("Fetching stars of {username}..."));
            }
            SyncProgress::FetchedPage {
                page, total_so_far, ..
            } => {
                self.bar.set_position(total_so_far as u64);
                self.bar
                    .set_message(format!("Fetched page {page} ({total_so_far} repositories)"));
            }
            SyncProgress::PageFetchRetry {
                page,
                retry_after_ms,
                attempt,
            } => {
                self.bar.set_message(format!(
                    "Page {page} failed, retry {attempt} in {:.1}s",
                    retry_after_ms as f64 / 1000.0
                ));
            }
            SyncProgress::FetchComplete { total, partial } => {
                let suffix = if partial { " (incomplete)" } else { "" };
                self.bar
                    .set_message(format!("Fetched {total} repositories{suffix}"));
            }
            SyncProgress::Reconciling { remote, local } => {
                self.bar.set_message(format!(
                    "Reconciling {remote} remote against {local} local..."
                ));
            }
            SyncProgress::Reconciled {
                inserted,
                updated,
                deleted,
                ..
            } => {
                self.bar.set_message(format!(
                    "{inserted} new, {updated} updated, {deleted} removed"
                ));
            }
            SyncProgress::Warning { message } => {
                self.bar.println(format!("warning: {message}"));
            }
            SyncProgress::RunFinished { status, error, .. } => {
                let message = match (status, error) {
                    (RunStatus::Failed, Some(error)) => format!("Sync failed: {error}"),
                    (status, _) => format!("Sync {status}"),
                };
                self.bar.finish_with_message(message);
            }
            _ => {}
        }
    }

    pub(crate) fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}
