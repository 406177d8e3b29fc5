//! GitHub API wire types for the starred list.
//!
//! Every field is optional: the starred endpoint omits or nulls fields freely
//! depending on the repository, and a missing field is "no data", not an error.

use serde::Deserialize;

/// One item of `GET /users/{user}/starred` with the `star+json` media type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StarredEnvelope {
    /// RFC 3339 timestamp of when the user starred the repository.
    #[serde(default)]
    pub starred_at: Option<String>,
    #[serde(default)]
    pub repo: Option<RepoPayload>,
}

/// GitHub repository - fields we need from the API response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoPayload {
    /// Full name including owner (e.g., "owner/repo").
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Primary programming language.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub owner: Option<OwnerPayload>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub stargazers_count: Option<u64>,
    #[serde(default)]
    pub forks_count: Option<u64>,
    #[serde(default)]
    pub watchers_count: Option<u64>,
    #[serde(default)]
    pub open_issues_count: Option<u64>,
    /// Repository topics; individual null entries are dropped on conversion.
    #[serde(default)]
    pub topics: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub license: Option<LicensePayload>,
    #[serde(default)]
    pub fork: Option<bool>,
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<String>,
}

/// Repository owner (user or organization).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerPayload {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Repository license summary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LicensePayload {
    /// Display name, e.g. "MIT License".
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub spdx_id: Option<String>,
}
