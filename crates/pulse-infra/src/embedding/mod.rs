//! Embedding sources: a local deterministic mock and the remote service client.

mod mock;

#[cfg(feature = "http-embedder")]
mod http;

pub use mock::{DEFAULT_DIMENSION, MOCK_MODEL, MockEmbedder, pseudo_embedding};

#[cfg(feature = "http-embedder")]
pub use http::{DEFAULT_REMOTE_MODEL, HttpEmbedder, HttpEmbedderConfig, validate_vector};
