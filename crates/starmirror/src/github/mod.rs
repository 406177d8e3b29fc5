//! GitHub API client for the starred list.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for GitHub API operations
//! - [`types`] - Wire types of the starred endpoint
//! - [`client`] - Paginated fetch of a user's starred repositories
//! - [`convert`] - Conversion to normalized [`StarredRepo`](crate::record::StarredRepo) records

mod client;
mod convert;
mod error;
mod types;

pub use client::{DEFAULT_API_BASE, GitHubClient, STARRED_PAGE_SIZE, next_page_url};
pub use convert::{parse_timestamp, to_starred_repo};
pub use error::{GitHubError, is_transient};
pub use types::{LicensePayload, OwnerPayload, RepoPayload, StarredEnvelope};
