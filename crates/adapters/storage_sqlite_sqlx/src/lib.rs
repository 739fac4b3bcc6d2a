//! # homewatch-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `Store` / `StoreTransaction` port traits defined in
//!   `homewatch-app::ports::store`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `homewatch-app` (for port traits) and `homewatch-domain` (for
//! domain types). The `app` and `domain` crates must never reference this
//! adapter.

mod alarms;
pub mod error;
mod logs;
pub mod pool;
mod store;
mod values;

pub use store::{SqliteStore, SqliteTransaction};
