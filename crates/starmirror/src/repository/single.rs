use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};
use uuid::Uuid;

use crate::entity::starred_repository::{ActiveModel, Column, Entity as StarredRepository, Model};

use super::errors::{RepositoryError, Result};

// ─── Single Record Operations ────────────────────────────────────────────────

/// Insert a new starred repository.
///
/// # Errors
/// Returns `RepositoryError::Database` if the insert fails (e.g., duplicate full name).
pub async fn insert(db: &DatabaseConnection, model: ActiveModel) -> Result<Model> {
    model.insert(db).await.map_err(RepositoryError::from)
}

/// Find a starred repository by its `owner/name` key.
pub async fn find_by_full_name(db: &DatabaseConnection, full_name: &str) -> Result<Option<Model>> {
    StarredRepository::find()
        .filter(Column::FullName.eq(full_name))
        .one(db)
        .await
        .map_err(RepositoryError::from)
}

/// Update an existing starred repository.
///
/// # Errors
/// Returns `RepositoryError::InvalidInput` if the model has no id and
/// `RepositoryError::NotFound` if no row has it.
pub async fn update(db: &DatabaseConnection, model: ActiveModel) -> Result<Model> {
    let id = match &model.id {
        ActiveValue::Set(id) | ActiveValue::Unchanged(id) => *id,
        ActiveValue::NotSet => {
            return Err(RepositoryError::InvalidInput {
                message: "Missing required field: id".to_string(),
            });
        }
    };
    model.update(db).await.map_err(|err| match err {
        DbErr::RecordNotUpdated => RepositoryError::not_found_by_id(id),
        other => RepositoryError::from(other),
    })
}

/// Delete a starred repository by its UUID.
///
/// Returns the number of rows deleted (0 or 1).
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<u64> {
    let result = StarredRepository::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected)
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use chrono::{Duration, Utc};

    use crate::connect_and_migrate;
    use crate::record::StarredRepo;

    use super::*;

    async fn setup_db() -> DatabaseConnection {
        connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate")
    }

    #[tokio::test]
    async fn test_insert_and_find_by_full_name() {
        let db = setup_db().await;
        let mut repo = StarredRepo::new("octocat/hello");
        repo.topics = vec!["rust".to_string(), "cli".to_string()];
        repo.stars_count = 42;

        let saved = insert(&db, repo.to_new_active_model(Utc::now()))
            .await
            .expect("insert should succeed");

        let found = find_by_full_name(&db, "octocat/hello")
            .await
            .expect("lookup should succeed")
            .expect("repo should exist");
        assert_eq!(found.id, saved.id);
        assert_eq!(found.stars_count, 42);
        assert_eq!(found.topic_list(), vec!["rust", "cli"]);
    }

    #[tokio::test]
    async fn test_insert_duplicate_full_name_fails() {
        let db = setup_db().await;
        let repo = StarredRepo::new("octocat/hello");
        insert(&db, repo.to_new_active_model(Utc::now()))
            .await
            .expect("first insert should succeed");

        let err = insert(&db, repo.to_new_active_model(Utc::now()))
            .await
            .expect_err("duplicate full name should be rejected");
        assert!(matches!(err, RepositoryError::Database(_)));
    }

    #[tokio::test]
    async fn test_update_overwrites_attributes_in_place() {
        let db = setup_db().await;
        let first_seen = Utc::now() - Duration::days(2);
        let mut repo = StarredRepo::new("octocat/hello");
        repo.description = Some("first".to_string());
        let saved = insert(&db, repo.to_new_active_model(first_seen))
            .await
            .expect("insert should succeed");

        repo.description = Some("second".to_string());
        let now = Utc::now();
        let updated = update(&db, repo.to_update_active_model(&saved, now))
            .await
            .expect("update should succeed");

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.created_at, saved.created_at);
        assert_eq!(updated.description.as_deref(), Some("second"));
        assert!(updated.updated_at > saved.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let db = setup_db().await;
        let saved = insert(
            &db,
            StarredRepo::new("octocat/hello").to_new_active_model(Utc::now()),
        )
        .await
        .expect("insert should succeed");
        delete(&db, saved.id).await.expect("delete should succeed");

        let err = update(
            &db,
            StarredRepo::new("octocat/hello").to_update_active_model(&saved, Utc::now()),
        )
        .await
        .expect_err("update of a deleted row should fail");
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_reports_rows_affected() {
        let db = setup_db().await;
        let saved = insert(
            &db,
            StarredRepo::new("octocat/gone").to_new_active_model(Utc::now()),
        )
        .await
        .expect("insert should succeed");

        assert_eq!(delete(&db, saved.id).await.expect("delete"), 1);
        assert_eq!(delete(&db, saved.id).await.expect("delete"), 0);
        assert!(
            find_by_full_name(&db, "octocat/gone")
                .await
                .expect("lookup should succeed")
                .is_none()
        );
    }
}
