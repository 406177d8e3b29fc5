//! SeaORM entity definitions for the starmirror database schema.

pub mod prelude;
pub mod starred_repository;
pub mod sync_run;
