//! Starmirror - keep a local copy of a GitHub user's starred repositories.
//!
//! A sync run walks the user's starred list page by page, then reconciles it
//! against the local store by full name: new stars are inserted, known ones are
//! overwritten in place, and unstarred ones are deleted. Runs are single-flight
//! and every run is recorded in an audit log.
//!
//! # Features
//!
//! - `sqlite` / `postgres` - Database backends.
//! - `migrate` - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to automatically run migrations on connection.
//!
//! # Example
//!
//! ```ignore
//! use starmirror::github::GitHubClient;
//! use starmirror::sync::{SyncCoordinator, SyncOptions};
//! use starmirror::connect_and_migrate;
//!
//! let db = connect_and_migrate("sqlite://starmirror.db?mode=rwc").await?;
//! let client = GitHubClient::new("https://api.github.com", "octocat", None)?;
//! let coordinator = SyncCoordinator::new(db, client, SyncOptions::default(), None);
//!
//! let run = coordinator.trigger_manual()?.wait().await?;
//! let status = coordinator.status().await?;
//! println!("{} ({} repositories)", run.status, status.total_repos);
//! ```

pub mod db;
pub mod entity;
pub mod github;
pub mod http;
pub mod rate_limit;
pub mod record;
pub mod repository;
pub mod retry;
pub mod scheduler;
pub mod sync;
pub mod sync_log;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use rate_limit::ApiRateLimiter;
pub use record::StarredRepo;
pub use repository::{RepositoryError, StarStore};
