//! SyncRun entity - audit record of one reconciliation attempt.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What started a sync run.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    /// Triggered on demand by a caller.
    #[sea_orm(string_value = "manual")]
    Manual,
    /// Triggered by the daily scheduler.
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
}

impl std::fmt::Display for RunKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunKind::Manual => write!(f, "manual"),
            RunKind::Scheduled => write!(f, "scheduled"),
        }
    }
}

/// Lifecycle status of a sync run.
///
/// Only `Running -> Succeeded` and `Running -> Failed` are valid transitions.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[sea_orm(string_value = "running")]
    Running,
    #[sea_orm(string_value = "succeeded")]
    Succeeded,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl RunStatus {
    /// Whether the run has reached a terminal state.
    #[inline]
    pub fn is_finished(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// SyncRun model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_runs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub kind: RunKind,
    pub status: RunStatus,

    /// Number of starred repositories returned by the remote.
    pub total_count: i32,
    /// Number of records inserted or updated.
    pub synced_count: i32,
    /// Number of records removed because they are no longer starred.
    pub deleted_count: i32,

    pub started_at: DateTimeWithTimeZone,
    /// Set exactly when `status` leaves `Running`.
    pub finished_at: Option<DateTimeWithTimeZone>,
    /// Failure cause, only set for failed runs.
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
