use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder};

use crate::entity::starred_repository::{Column, Entity as StarredRepository, Model};

use super::errors::{RepositoryError, Result};

const MIN_PER_PAGE: u64 = 1;
const MAX_PER_PAGE: u64 = 100;

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (1-indexed).
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
}

impl Pagination {
    /// Create a new pagination.
    ///
    /// `page` is raised to at least 1 and `per_page` clamped to `1..=100`.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(MIN_PER_PAGE, MAX_PER_PAGE),
        }
    }

    /// Zero-based page index as expected by sea-orm paginators.
    pub(crate) fn index(&self) -> u64 {
        self.page.saturating_sub(1)
    }
}

/// Result of a paginated query.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    /// The items for the current page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Current page number (1-indexed).
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

// ─── Query Operations ────────────────────────────────────────────────────────

/// Load every mirrored repository, ordered by full name.
///
/// This is the reconciler's local snapshot and is read once per pass.
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>> {
    StarredRepository::find()
        .order_by_asc(Column::FullName)
        .all(db)
        .await
        .map_err(RepositoryError::from)
}

/// Count mirrored repositories.
pub async fn count(db: &DatabaseConnection) -> Result<u64> {
    StarredRepository::find()
        .count(db)
        .await
        .map_err(RepositoryError::from)
}
