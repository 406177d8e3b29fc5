//! Sync options, results, and tuning constants.

use serde::Serialize;

use crate::record::StarredRepo;

use super::error::SyncError;

/// Maximum backoff delay in milliseconds when a page fetch is retried.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Maximum retries for a single page request.
pub const MAX_PAGE_RETRIES: u32 = 3;

/// Options for a reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Delete local-only records even when the fetch stopped early.
    /// Off by default.
    pub prune_on_partial_fetch: bool,
}

/// Snapshot of the remote starred list.
#[derive(Debug, Default)]
pub struct StarredFetch {
    /// Repositories in remote order, not deduplicated.
    pub repos: Vec<StarredRepo>,
    /// Set when a page after the first failed.
    pub partial: Option<SyncError>,
}

impl StarredFetch {
    /// Whether every page was fetched.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.partial.is_none()
    }
}

/// Counts produced by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Local-only records kept because the fetch was partial.
    pub deletions_skipped: usize,
}

impl ReconcileStats {
    /// Remote records written, inserted or updated.
    #[must_use]
    pub fn synced(&self) -> usize {
        self.inserted + self.updated
    }
}
