//! Post storage: SQLite through SeaORM, plus an in-memory fallback.

mod connections;
mod memory;

#[cfg(feature = "sqlite")]
mod sql_base;
#[cfg(feature = "sqlite")]
pub mod sqlite_repo;

#[cfg(feature = "sqlite")]
pub mod entity;

pub use connections::DatabaseConfig;
pub use memory::InMemoryPostRepository;

#[cfg(feature = "sqlite")]
pub use connections::{connect, ensure_schema};
#[cfg(feature = "sqlite")]
pub use sql_base::SqlBaseRepository;
#[cfg(feature = "sqlite")]
pub use sqlite_repo::SqlitePostRepository;
