//! Common re-exports for convenient entity usage.

pub use super::starred_repository::{
    ActiveModel as StarredRepositoryActiveModel, Column as StarredRepositoryColumn,
    Entity as StarredRepository, Model as StarredRepositoryModel,
};
pub use super::sync_run::{
    ActiveModel as SyncRunActiveModel, Column as SyncRunColumn, Entity as SyncRun,
    Model as SyncRunModel, RunKind, RunStatus,
};
