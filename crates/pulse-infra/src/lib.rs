//! # Pulse Infrastructure
//!
//! Concrete implementations of the ports defined in `pulse-core`:
//! post storage and embedding sources.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory store and mock embedder only
//! - `sqlite` - SQLite post storage via SeaORM
//! - `http-embedder` - Remote embedding service client via reqwest

pub mod database;
pub mod embedding;

// Re-exports - always available
pub use database::{DatabaseConfig, InMemoryPostRepository};
pub use embedding::MockEmbedder;

#[cfg(feature = "sqlite")]
pub use database::SqlitePostRepository;

#[cfg(feature = "http-embedder")]
pub use embedding::{HttpEmbedder, HttpEmbedderConfig};
