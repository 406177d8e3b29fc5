//! Mirroring the starred list into the local store.
//!
//! # Module Structure
//!
//! - [`types`] - `SyncOptions`, `StarredFetch`, `ReconcileStats`, constants
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`reconcile`] - The diff-and-apply pass over a [`StarStore`](crate::repository::StarStore)
//! - [`coordinator`] - Single-flight runs, status and history
//!
//! # Example
//!
//! ```ignore
//! use starmirror::github::GitHubClient;
//! use starmirror::sync::{SyncCoordinator, SyncOptions};
//!
//! let client = GitHubClient::new("https://api.github.com", "octocat", None)?;
//! let coordinator = SyncCoordinator::new(db, client, SyncOptions::default(), None);
//! let run = coordinator.trigger_manual()?.wait().await?;
//! println!("{} synced, {} deleted", run.synced_count, run.deleted_count);
//! ```

mod coordinator;
mod error;
mod progress;
pub mod reconcile;
mod types;

pub use coordinator::{RunHandle, SyncCoordinator, SyncHistoryPage, SyncStatus, TriggerResponse};
pub use error::SyncError;
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use reconcile::{reconcile, reconcile_at};
pub use types::{
    INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_PAGE_RETRIES, ReconcileStats, StarredFetch,
    SyncOptions,
};
