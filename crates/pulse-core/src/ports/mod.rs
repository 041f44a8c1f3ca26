//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod embedder;
mod repository;

pub use embedder::{Embedder, EmbeddingError, EmbeddingOutput};
pub use repository::{BaseRepository, PostRepository};
