//! Domain values to wire DTOs.

use pulse_core::domain::{Embedding, Post};
use pulse_core::service::{EmbeddingStatus, FeedSearch, PostOutcome, ScoredPost, SearchMode};
use pulse_shared::dto::{
    EmbeddingStatusResponse, FeedSearchResponse, PostOutcomeResponse, PostResponse,
    ScoredPostResponse,
};

pub fn post_response(post: Post) -> PostResponse {
    let (embeddings, embedding_model, embedding_generated_at) = match post.embedding {
        Embedding::Embedded {
            vector,
            model,
            generated_at,
        } => (Some(vector), Some(model), Some(generated_at)),
        Embedding::Unembedded => (None, None, None),
    };

    PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        author: post.author,
        created_at: post.created_at,
        likes: post.likes,
        embeddings,
        embedding_model,
        embedding_generated_at,
    }
}

pub fn scored_response(scored: ScoredPost) -> ScoredPostResponse {
    ScoredPostResponse {
        post: post_response(scored.post),
        similarity_score: scored.score,
    }
}

pub fn outcome_response(outcome: PostOutcome) -> PostOutcomeResponse {
    let embedding = match outcome.embedding {
        EmbeddingStatus::Generated { model } => EmbeddingStatusResponse {
            status: "generated".to_string(),
            model: Some(model),
            reason: None,
        },
        EmbeddingStatus::Fallback { model, reason } => EmbeddingStatusResponse {
            status: "fallback".to_string(),
            model: Some(model),
            reason: Some(reason),
        },
        EmbeddingStatus::Failed { reason } => EmbeddingStatusResponse {
            status: "failed".to_string(),
            model: None,
            reason: Some(reason),
        },
    };

    PostOutcomeResponse {
        post: post_response(outcome.post),
        embedding,
    }
}

pub fn feed_search_response(search: FeedSearch) -> FeedSearchResponse {
    let (mode, model, reason) = match search.mode {
        SearchMode::All => ("all", None, None),
        SearchMode::Semantic {
            model,
            fallback_reason,
        } => ("semantic", Some(model), fallback_reason),
        SearchMode::Text { reason } => ("text", None, Some(reason)),
    };

    FeedSearchResponse {
        mode: mode.to_string(),
        model,
        reason,
        results: search.results.into_iter().map(scored_response).collect(),
    }
}
