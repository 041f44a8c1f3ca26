use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Post entity - one user submission in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub likes: u64,
    pub embedding: Embedding,
}

/// Embedding state of a post.
///
/// The vector, the model that produced it and the generation time only
/// ever exist together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Embedding {
    Embedded {
        vector: Vec<f32>,
        model: String,
        generated_at: DateTime<Utc>,
    },
    #[default]
    Unembedded,
}

impl Embedding {
    pub fn is_embedded(&self) -> bool {
        matches!(self, Embedding::Embedded { .. })
    }

    /// The vector and model name, if any.
    pub fn vector(&self) -> Option<(&[f32], &str)> {
        match self {
            Embedding::Embedded { vector, model, .. } => Some((vector.as_slice(), model.as_str())),
            Embedding::Unembedded => None,
        }
    }
}

/// Validated payload for creating a post.
///
/// Fields are private so a `NewPost` can only come out of [`NewPost::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    title: String,
    content: String,
    author: String,
}

impl NewPost {
    /// Validate a creation request. Every field must be non-empty after
    /// trimming; the stored text keeps its original whitespace.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        let content = content.into();
        let author = author.into();

        let missing: Vec<&str> = [("title", &title), ("content", &content), ("author", &author)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();

        if !missing.is_empty() {
            return Err(DomainError::Validation(format!(
                "{} must not be empty",
                missing.join(", ")
            )));
        }

        Ok(Self {
            title,
            content,
            author,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn author(&self) -> &str {
        &self.author
    }
}

impl Post {
    /// Create a new, unliked and unembedded post.
    pub fn new(data: NewPost) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: data.title,
            content: data.content,
            author: data.author,
            created_at: Utc::now(),
            likes: 0,
            embedding: Embedding::Unembedded,
        }
    }

    /// Case-insensitive substring match over title, content and author.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_text(&self, needle: &str) -> bool {
        [&self.title, &self.content, &self.author]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}
