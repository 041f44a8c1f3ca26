//! Embedding port - turns text into vectors for similarity search.

use async_trait::async_trait;

/// A vector together with the name of the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingOutput {
    pub vector: Vec<f32>,
    pub model: String,
}

/// Embedder trait - abstraction over embedding backends (remote service, local mock).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a free-text query.
    async fn embed(&self, text: &str) -> Result<EmbeddingOutput, EmbeddingError>;

    /// Embed a post. Backends that take title and content separately
    /// override this; the rest embed the joined text.
    async fn embed_post(
        &self,
        title: &str,
        content: &str,
    ) -> Result<EmbeddingOutput, EmbeddingError> {
        self.embed(&format!("{title} {content}")).await
    }

    /// Model name recorded alongside produced vectors.
    fn model_name(&self) -> &str;
}

/// Embedding failures. Every variant means the source is unavailable for
/// now; callers are expected to fall back rather than fail.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding request timed out")]
    Timeout,

    #[error("embedding service unreachable: {0}")]
    Transport(String),

    #[error("embedding service returned status {0}")]
    Status(u16),

    #[error("malformed embedding response: {0}")]
    Malformed(String),
}
