//! Conversion from GitHub wire types to normalized records.

use chrono::{DateTime, Utc};

use super::types::{RepoPayload, StarredEnvelope};
use crate::record::StarredRepo;

/// Convert one starred-list item into a record.
///
/// Returns `None` when the item carries no repository or the repository has
/// no full name; the caller logs and skips it.
pub fn to_starred_repo(envelope: StarredEnvelope) -> Option<StarredRepo> {
    let starred_at = parse_timestamp("starred_at", envelope.starred_at.as_deref());
    let repo = envelope.repo?;
    let full_name = repo
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    let mut record = StarredRepo::new(full_name);
    apply_payload(&mut record, repo);
    record.starred_at = starred_at;
    Some(record)
}

fn apply_payload(record: &mut StarredRepo, repo: RepoPayload) {
    if let Some(name) = repo.name.filter(|n| !n.is_empty()) {
        record.name = name;
    }
    if let Some(owner) = repo.owner {
        if owner.login.is_some() {
            record.owner_name = owner.login;
        }
        record.owner_avatar_url = owner.avatar_url;
    }

    record.description = repo.description;
    record.language = repo.language;
    record.html_url = repo.html_url;
    record.homepage = repo.homepage.filter(|h| !h.is_empty());
    record.stars_count = count(repo.stargazers_count);
    record.forks_count = count(repo.forks_count);
    record.watchers_count = count(repo.watchers_count);
    record.open_issues_count = count(repo.open_issues_count);
    record.topics = repo
        .topics
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .collect();
    record.license_name = repo.license.and_then(|l| l.name.or(l.spdx_id));
    record.is_fork = repo.fork.unwrap_or(false);
    record.is_archived = repo.archived.unwrap_or(false);
    record.created_at = parse_timestamp("created_at", repo.created_at.as_deref());
    record.updated_at = parse_timestamp("updated_at", repo.updated_at.as_deref());
    record.pushed_at = parse_timestamp("pushed_at", repo.pushed_at.as_deref());
}

fn count(value: Option<u64>) -> u32 {
    value
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Parse an RFC 3339 timestamp; unparseable values become `None`.
pub fn parse_timestamp(field: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = value?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!(field, value = raw, error = %e, "Ignoring unparseable timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn envelope(json: serde_json::Value) -> StarredEnvelope {
        serde_json::from_value(json).expect("test envelope should decode")
    }

    #[test]
    fn test_full_payload_maps_field_by_field() {
        let record = to_starred_repo(envelope(serde_json::json!({
            "starred_at": "2024-05-01T10:00:00Z",
            "repo": {
                "full_name": "rust-lang/rust",
                "name": "rust",
                "description": "Empowering everyone",
                "language": "Rust",
                "owner": {"login": "rust-lang", "avatar_url": "https://avatars/1"},
                "html_url": "https://github.com/rust-lang/rust",
                "homepage": "https://www.rust-lang.org",
                "stargazers_count": 100000,
                "forks_count": 12000,
                "watchers_count": 100000,
                "open_issues_count": 9000,
                "topics": ["compiler", "language"],
                "license": {"name": "Other", "spdx_id": "NOASSERTION"},
                "fork": false,
                "archived": true,
                "created_at": "2010-06-16T20:39:03Z",
                "updated_at": "2024-05-01T00:00:00Z",
                "pushed_at": "2024-05-01T01:00:00+02:00"
            }
        })))
        .expect("record should convert");

        assert_eq!(record.full_name, "rust-lang/rust");
        assert_eq!(record.owner_name.as_deref(), Some("rust-lang"));
        assert_eq!(record.stars_count, 100_000);
        assert_eq!(record.topics, vec!["compiler", "language"]);
        assert_eq!(record.license_name.as_deref(), Some("Other"));
        assert!(record.is_archived);
        assert!(!record.is_fork);
        assert_eq!(
            record.starred_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            record.pushed_at,
            Some(Utc.with_ymd_and_hms(2024, 4, 30, 23, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_sparse_payload_uses_defaults() {
        let record = to_starred_repo(envelope(serde_json::json!({
            "repo": {
                "full_name": "octocat/sparse",
                "owner": null,
                "license": null,
                "topics": ["keep", null],
                "stargazers_count": null,
                "homepage": ""
            }
        })))
        .expect("record should convert");

        assert_eq!(record.name, "sparse");
        assert_eq!(record.owner_name.as_deref(), Some("octocat"));
        assert_eq!(record.stars_count, 0);
        assert_eq!(record.topics, vec!["keep"]);
        assert!(record.license_name.is_none());
        assert!(record.homepage.is_none());
        assert!(record.starred_at.is_none());
    }

    #[test]
    fn test_missing_repo_or_full_name_is_skipped() {
        assert!(to_starred_repo(envelope(serde_json::json!({"starred_at": null}))).is_none());
        assert!(
            to_starred_repo(envelope(serde_json::json!({"repo": {"name": "nameless"}}))).is_none()
        );
        assert!(to_starred_repo(envelope(serde_json::json!({"repo": {"full_name": "  "}}))).is_none());
    }

    #[test]
    fn test_license_falls_back_to_spdx_id() {
        let record = to_starred_repo(envelope(serde_json::json!({
            "repo": {"full_name": "a/b", "license": {"spdx_id": "MIT"}}
        })))
        .expect("record should convert");
        assert_eq!(record.license_name.as_deref(), Some("MIT"));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("created_at", Some("yesterday")).is_none());
        assert!(parse_timestamp("created_at", None).is_none());
    }
}
