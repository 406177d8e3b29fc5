use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::entity::starred_repository::{ActiveModel, Model};

use super::errors::Result;

/// Write boundary of the reconciler.
///
/// Implemented for [`DatabaseConnection`]; tests wrap it to inject failures.
#[async_trait]
pub trait StarStore: Send + Sync {
    /// Load every mirrored repository.
    async fn load_all(&self) -> Result<Vec<Model>>;

    async fn insert(&self, model: ActiveModel) -> Result<Model>;

    async fn update(&self, model: ActiveModel) -> Result<Model>;

    /// Delete by local id, returning the number of rows removed.
    async fn delete(&self, id: Uuid) -> Result<u64>;

    async fn count(&self) -> Result<u64>;
}

#[async_trait]
impl StarStore for DatabaseConnection {
    async fn load_all(&self) -> Result<Vec<Model>> {
        super::query::find_all(self).await
    }

    async fn insert(&self, model: ActiveModel) -> Result<Model> {
        super::single::insert(self, model).await
    }

    async fn update(&self, model: ActiveModel) -> Result<Model> {
        super::single::update(self, model).await
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        super::single::delete(self, id).await
    }

    async fn count(&self) -> Result<u64> {
        super::query::count(self).await
    }
}
