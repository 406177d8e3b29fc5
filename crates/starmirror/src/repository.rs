//! Store operations for mirrored starred repositories.
//!
//! Plain CRUD functions over [`DatabaseConnection`](sea_orm::DatabaseConnection)
//! plus the [`StarStore`] trait the reconciler writes through.

mod errors;
mod query;
mod single;
mod store;

pub use errors::{RepositoryError, Result};
pub use query::{PaginatedResult, Pagination, count, find_all};
pub use single::{delete, find_by_full_name, insert, update};
pub use store::StarStore;
