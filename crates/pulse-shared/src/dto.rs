//! Data Transfer Objects - request/response types for the API.
//!
//! Post fields are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A post as returned by the API. The embedding fields are omitted for
/// posts that have not been embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub likes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_generated_at: Option<DateTime<Utc>>,
}

/// A post together with its similarity to the search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredPostResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub similarity_score: f64,
}

/// Request to create a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub author: String,
}

/// Outcome of embedding a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingStatusResponse {
    /// `generated`, `fallback` or `failed`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Response for post creation and embedding regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostOutcomeResponse {
    pub post: PostResponse,
    pub embedding: EmbeddingStatusResponse,
}

/// Query string of the post listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsQuery {
    /// Only posts by exactly this author.
    pub author: Option<String>,
}

/// Query string of the feed search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedSearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Feed search results and the strategy that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSearchResponse {
    /// `all`, `semantic` or `text`.
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Why semantic search was skipped or degraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub results: Vec<ScoredPostResponse>,
}

/// Top-K search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<ScoredPostResponse>,
}

/// Error body of the top-K search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchErrorResponse {
    pub error: String,
}

impl SearchErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_posts: u64,
    pub posts_with_embeddings: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BackfillResponse {
    pub embedded: usize,
    pub fallback: usize,
    pub failed: usize,
}
