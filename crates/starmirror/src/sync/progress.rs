//! Progress reporting types for sync runs.

use uuid::Uuid;

use crate::entity::sync_run::{RunKind, RunStatus};

/// Progress events emitted while a sync run is in flight.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// A run acquired the guard and wrote its `running` log row.
    RunStarted {
        run_id: Uuid,
        kind: RunKind,
    },

    /// Starting to walk the user's starred list.
    FetchingStarred {
        /// The user whose stars are mirrored.
        username: String,
    },

    /// Fetched a page of starred repositories.
    FetchedPage {
        /// Page number (1-indexed).
        page: u32,
        /// Number of repos on this page.
        count: usize,
        /// Running total of repos fetched so far.
        total_so_far: usize,
    },

    /// A page request failed transiently and will be retried.
    PageFetchRetry {
        /// Page number being retried.
        page: u32,
        /// Time to wait before retry (ms).
        retry_after_ms: u64,
        /// Current attempt number.
        attempt: u32,
    },

    /// Finished walking the starred list.
    FetchComplete {
        /// Total number of repositories fetched.
        total: usize,
        /// Whether paging stopped early on a failed page.
        partial: bool,
    },

    /// Diffing the remote snapshot against the local store.
    Reconciling {
        remote: usize,
        local: usize,
    },

    /// Reconciliation finished.
    Reconciled {
        inserted: usize,
        updated: usize,
        deleted: usize,
        deletions_skipped: usize,
    },

    /// The run's log row reached a terminal status.
    RunFinished {
        run_id: Uuid,
        status: RunStatus,
        /// Failure cause, for failed runs.
        error: Option<String>,
    },

    /// Warning message (non-fatal).
    Warning {
        /// Warning message.
        message: String,
    },
}

/// Callback for progress updates during sync runs.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
