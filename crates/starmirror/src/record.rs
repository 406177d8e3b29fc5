//! Normalized starred-repository record, independent of the wire format.

use chrono::{DateTime, Utc};
use sea_orm::Set;
use uuid::Uuid;

use crate::entity::starred_repository::{ActiveModel, Model};

/// A starred repository as observed on the remote.
///
/// Counts are unsigned; missing upstream values are already folded to zero,
/// `None`, `false`, or an empty topic list by the fetch client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarredRepo {
    /// `owner/name`, the reconciliation key.
    pub full_name: String,
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub owner_name: Option<String>,
    pub owner_avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub homepage: Option<String>,
    pub stars_count: u32,
    pub forks_count: u32,
    pub watchers_count: u32,
    pub open_issues_count: u32,
    /// Topics in remote order.
    pub topics: Vec<String>,
    pub license_name: Option<String>,
    pub is_fork: bool,
    pub is_archived: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    /// When the user starred the repository, if the remote reported it.
    pub starred_at: Option<DateTime<Utc>>,
}

impl StarredRepo {
    /// Create a record with only its identity filled in.
    ///
    /// `name` and `owner_name` are derived from `full_name`.
    pub fn new(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let (owner, name) = match full_name.split_once('/') {
            Some((owner, name)) => (Some(owner.to_string()), name.to_string()),
            None => (None, full_name.clone()),
        };
        Self {
            full_name,
            name,
            owner_name: owner,
            ..Self::default()
        }
    }

    /// Build the active model for a first-time insert.
    ///
    /// The local id is freshly generated and both tracking timestamps are `now`.
    pub fn to_new_active_model(&self, now: DateTime<Utc>) -> ActiveModel {
        self.to_active_model(Uuid::new_v4(), now, now)
    }

    /// Build the active model that overwrites `existing` with the remote attributes.
    ///
    /// The local id and `created_at` of `existing` are kept.
    pub fn to_update_active_model(&self, existing: &Model, now: DateTime<Utc>) -> ActiveModel {
        self.to_active_model(existing.id, existing.created_at.to_utc(), now)
    }

    fn to_active_model(
        &self,
        id: Uuid,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> ActiveModel {
        ActiveModel {
            id: Set(id),
            full_name: Set(self.full_name.clone()),
            name: Set(self.name.clone()),
            description: Set(self.description.clone()),
            language: Set(self.language.clone()),
            owner_name: Set(self.owner_name.clone()),
            owner_avatar_url: Set(self.owner_avatar_url.clone()),
            html_url: Set(self.html_url.clone()),
            homepage: Set(self.homepage.clone()),
            topics: Set(serde_json::Value::from(self.topics.clone())),
            license_name: Set(self.license_name.clone()),
            stars_count: Set(clamp_count(self.stars_count)),
            forks_count: Set(clamp_count(self.forks_count)),
            watchers_count: Set(clamp_count(self.watchers_count)),
            open_issues_count: Set(clamp_count(self.open_issues_count)),
            is_fork: Set(self.is_fork),
            is_archived: Set(self.is_archived),
            repo_created_at: Set(self.created_at.map(|t| t.fixed_offset())),
            repo_updated_at: Set(self.updated_at.map(|t| t.fixed_offset())),
            repo_pushed_at: Set(self.pushed_at.map(|t| t.fixed_offset())),
            starred_at: Set(self.starred_at.map(|t| t.fixed_offset())),
            created_at: Set(created_at.fixed_offset()),
            updated_at: Set(updated_at.fixed_offset()),
        }
    }
}

/// Store counts as `i32`, saturating instead of wrapping.
fn clamp_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
