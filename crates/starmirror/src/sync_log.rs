//! Audit log of sync runs.
//!
//! Every run inserts one `running` row when it starts and updates it exactly
//! once when it finishes. Finished rows are never touched again.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::sync_run::{ActiveModel, Column, Entity as SyncRun, Model, RunKind, RunStatus};
use crate::repository::{PaginatedResult, Pagination, RepositoryError, Result};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// The run completed; counts come from the fetch and the reconcile pass.
    Succeeded {
        total: usize,
        synced: usize,
        deleted: usize,
    },
    /// The run failed. `total` is whatever the fetch observed before failing.
    Failed { total: usize, message: String },
}

/// Insert a new `running` row for a run of the given kind.
pub async fn start_run(db: &DatabaseConnection, kind: RunKind, now: DateTime<Utc>) -> Result<Model> {
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(kind),
        status: Set(RunStatus::Running),
        total_count: Set(0),
        synced_count: Set(0),
        deleted_count: Set(0),
        started_at: Set(now.fixed_offset()),
        finished_at: Set(None),
        error_message: Set(None),
        created_at: Set(now.fixed_offset()),
    };
    model.insert(db).await.map_err(RepositoryError::from)
}

/// Record the outcome of a running run.
///
/// # Errors
/// Returns `RepositoryError::InvalidInput` if `run` has already finished.
pub async fn finish_run(
    db: &DatabaseConnection,
    run: Model,
    result: RunResult,
    now: DateTime<Utc>,
) -> Result<Model> {
    if run.status.is_finished() {
        return Err(RepositoryError::InvalidInput {
            message: format!("sync run {} already finished as {}", run.id, run.status),
        });
    }

    let mut active: ActiveModel = run.into();
    active.finished_at = Set(Some(now.fixed_offset()));
    match result {
        RunResult::Succeeded {
            total,
            synced,
            deleted,
        } => {
            active.status = Set(RunStatus::Succeeded);
            active.total_count = Set(to_count(total));
            active.synced_count = Set(to_count(synced));
            active.deleted_count = Set(to_count(deleted));
        }
        RunResult::Failed { total, message } => {
            active.status = Set(RunStatus::Failed);
            active.total_count = Set(to_count(total));
            active.error_message = Set(Some(message));
        }
    }
    active.update(db).await.map_err(RepositoryError::from)
}

/// Page through runs, newest first.
pub async fn find_page(
    db: &DatabaseConnection,
    pagination: Pagination,
) -> Result<PaginatedResult<Model>> {
    let paginator = SyncRun::find()
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::StartedAt)
        .paginate(db, pagination.per_page);

    let total = paginator.num_items().await?;
    let total_pages = paginator.num_pages().await?;
    // Past the last page there is nothing to fetch, and the offset could overflow.
    let items = if pagination.page > total_pages {
        Vec::new()
    } else {
        paginator.fetch_page(pagination.index()).await?
    };

    Ok(PaginatedResult {
        items,
        total,
        page: pagination.page,
        per_page: pagination.per_page,
        total_pages,
    })
}

/// The most recently finished successful run, if any.
pub async fn latest_success(db: &DatabaseConnection) -> Result<Option<Model>> {
    SyncRun::find()
        .filter(Column::Status.eq(RunStatus::Succeeded))
        .order_by_desc(Column::FinishedAt)
        .one(db)
        .await
        .map_err(RepositoryError::from)
}

/// Number of runs currently marked `running`.
pub async fn count_running(db: &DatabaseConnection) -> Result<u64> {
    SyncRun::find()
        .filter(Column::Status.eq(RunStatus::Running))
        .count(db)
        .await
        .map_err(RepositoryError::from)
}

fn to_count(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
