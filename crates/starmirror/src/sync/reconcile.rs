//! Diff a remote snapshot against the local store and apply the result.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::entity::starred_repository::Model;
use crate::repository::StarStore;

use super::error::SyncError;
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{ReconcileStats, StarredFetch, SyncOptions};

/// Reconcile the store with `remote`, stamping every write with the current time.
///
/// See [`reconcile_at`].
pub async fn reconcile<S>(
    store: &S,
    remote: &StarredFetch,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<ReconcileStats, SyncError>
where
    S: StarStore + ?Sized,
{
    reconcile_at(store, remote, options, Utc::now(), on_progress).await
}

/// Reconcile the store with `remote` using `now` for every write of the pass.
///
/// Records are keyed by full name. Remote records absent locally are inserted,
/// present ones are overwritten in place (id and `created_at` kept), and local
/// records the remote no longer lists are deleted. Deletion only happens when
/// the fetch was complete, unless `options.prune_on_partial_fetch` is set.
///
/// The local snapshot is read once, before any write. Any store failure aborts
/// the pass with [`SyncError::Store`].
pub async fn reconcile_at<S>(
    store: &S,
    remote: &StarredFetch,
    options: &SyncOptions,
    now: DateTime<Utc>,
    on_progress: Option<&ProgressCallback>,
) -> Result<ReconcileStats, SyncError>
where
    S: StarStore + ?Sized,
{
    let local = store.load_all().await?;
    emit(
        on_progress,
        SyncProgress::Reconciling {
            remote: remote.repos.len(),
            local: local.len(),
        },
    );

    let mut index: HashMap<String, Model> = local
        .into_iter()
        .map(|m| (m.full_name.clone(), m))
        .collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(remote.repos.len());
    let mut stats = ReconcileStats::default();

    for repo in &remote.repos {
        let saved = match index.get(&repo.full_name) {
            Some(existing) => {
                let model = repo.to_update_active_model(existing, now);
                let saved = store.update(model).await?;
                stats.updated += 1;
                tracing::debug!(full_name = %repo.full_name, "Updated starred repository");
                saved
            }
            None => {
                let saved = store.insert(repo.to_new_active_model(now)).await?;
                stats.inserted += 1;
                tracing::debug!(full_name = %repo.full_name, "Inserted starred repository");
                saved
            }
        };
        seen.insert(saved.full_name.clone());
        index.insert(saved.full_name.clone(), saved);
    }

    let mut stale: Vec<&Model> = index
        .values()
        .filter(|m| !seen.contains(&m.full_name))
        .collect();
    stale.sort_by(|a, b| a.full_name.cmp(&b.full_name));

    if remote.is_complete() || options.prune_on_partial_fetch {
        for model in stale {
            stats.deleted += usize::try_from(store.delete(model.id).await?).unwrap_or(0);
            tracing::info!(full_name = %model.full_name, "Deleted unstarred repository");
        }
    } else if !stale.is_empty() {
        stats.deletions_skipped = stale.len();
        tracing::warn!(
            skipped = stale.len(),
            "Starred list incomplete, keeping local-only repositories"
        );
    }

    emit(
        on_progress,
        SyncProgress::Reconciled {
            inserted: stats.inserted,
            updated: stats.updated,
            deleted: stats.deleted,
            deletions_skipped: stats.deletions_skipped,
        },
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::GitHubError;
    use crate::http::HttpError;
    use crate::record::StarredRepo;

    #[test]
    fn test_reconcile_stats_default_is_zero() {
        let stats = ReconcileStats::default();
        assert_eq!(stats.synced(), 0);
        assert_eq!(stats.deleted, 0);
    }

    #[test]
    fn test_partial_fetch_is_not_complete() {
        let fetch = StarredFetch {
            repos: vec![StarredRepo::new("a/b")],
            partial: Some(SyncError::RemotePartial {
                page: 2,
                fetched: 1,
                source: GitHubError::Http(HttpError::Transport("reset".to_string())),
            }),
        };
        assert!(!fetch.is_complete());
    }
}
