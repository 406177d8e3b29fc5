//! GitHub API error types.

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when interacting with the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The API answered with a non-success status.
    #[error("GitHub API returned {status} for {url}")]
    Status { status: u16, url: String },

    /// The response body was not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Whether a failed page request is worth retrying.
///
/// Transport failures, 429 and 5xx are transient; any other status or a
/// malformed body is not.
pub fn is_transient(e: &GitHubError) -> bool {
    match e {
        GitHubError::Http(_) => true,
        GitHubError::Status { status, .. } => *status == 429 || *status >= 500,
        GitHubError::Json(_) | GitHubError::Config(_) => false,
    }
}
