use thiserror::Error;

use crate::github::GitHubError;
use crate::repository::RepositoryError;

/// Failure taxonomy of the sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The first page of the starred list could not be fetched.
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(#[source] GitHubError),

    /// A later page failed; the repositories fetched before it are still usable.
    #[error("starred list incomplete: page {page} failed after {fetched} repositories: {source}")]
    RemotePartial {
        page: u32,
        fetched: usize,
        #[source]
        source: GitHubError,
    },

    /// Reading or writing the local store failed.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),

    /// A run is already in progress; triggers are rejected, never queued.
    #[error("a sync run is already in progress")]
    AlreadyRunning,

    /// The run task ended without reporting an outcome.
    #[error("sync run interrupted: {0}")]
    Interrupted(String),
}
