//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

use crate::ports::EmbeddingError;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Two vectors of different length were compared. Embeddings of one
    /// model always share a dimension, so this indicates a caller bug.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(#[from] EmbeddingError),

    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A stored record could not be turned back into a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl DomainError {
    pub fn post_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity_type: "Post",
            id,
        }
    }

    /// Lift a repository error raised while addressing post `id`, turning
    /// `RepoError::NotFound` into a typed `NotFound`.
    pub fn from_repo_for_post(id: Uuid, err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::post_not_found(id),
            other => Self::Repository(other),
        }
    }
}
