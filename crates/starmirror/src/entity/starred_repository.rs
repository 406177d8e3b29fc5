//! StarredRepository entity - one mirrored repository from the user's starred list.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// StarredRepository model - the local copy of a starred repository.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "starred_repositories")]
pub struct Model {
    /// Local UUID primary key, assigned on first insert.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Identity ────────────────────────────────────────────────────────────
    /// `owner/name`, the reconciliation key.
    #[sea_orm(unique)]
    pub full_name: String,
    /// Repository name (URL-safe slug).
    pub name: String,

    // ─── Content ─────────────────────────────────────────────────────────────
    /// Repository description.
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Primary programming language.
    pub language: Option<String>,
    /// Owner login (user or organization).
    pub owner_name: Option<String>,
    /// Owner avatar URL.
    #[sea_orm(column_type = "Text", nullable)]
    pub owner_avatar_url: Option<String>,
    /// Canonical web URL of the repository.
    #[sea_orm(column_type = "Text", nullable)]
    pub html_url: Option<String>,
    /// Project homepage URL.
    #[sea_orm(column_type = "Text", nullable)]
    pub homepage: Option<String>,
    /// Repository topics in remote order (JSON array of strings).
    #[sea_orm(column_type = "Json")]
    pub topics: serde_json::Value,
    /// License display name.
    pub license_name: Option<String>,

    // ─── Statistics ──────────────────────────────────────────────────────────
    pub stars_count: i32,
    pub forks_count: i32,
    pub watchers_count: i32,
    pub open_issues_count: i32,

    // ─── Flags ───────────────────────────────────────────────────────────────
    #[sea_orm(default_value = false)]
    pub is_fork: bool,
    #[sea_orm(default_value = false)]
    pub is_archived: bool,

    // ─── Remote Timestamps ───────────────────────────────────────────────────
    /// When the repository was created on GitHub.
    pub repo_created_at: Option<DateTimeWithTimeZone>,
    /// When the repository was last updated on GitHub.
    pub repo_updated_at: Option<DateTimeWithTimeZone>,
    /// When code was last pushed.
    pub repo_pushed_at: Option<DateTimeWithTimeZone>,
    /// When the user starred the repository.
    pub starred_at: Option<DateTimeWithTimeZone>,

    // ─── Tracking ────────────────────────────────────────────────────────────
    /// When this record was first inserted locally.
    pub created_at: DateTimeWithTimeZone,
    /// When this record was last written by a sync pass.
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Topics as a list of strings.
    ///
    /// Non-string entries in the stored JSON are ignored.
    pub fn topic_list(&self) -> Vec<String> {
        self.topics
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}
