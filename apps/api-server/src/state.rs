//! Application state - shared across all handlers.

use std::sync::Arc;

use pulse_core::ports::{Embedder, PostRepository};
use pulse_core::service::FeedService;
use pulse_infra::database::{DatabaseConfig, InMemoryPostRepository};
use pulse_infra::embedding::MockEmbedder;

#[cfg(feature = "http-embedder")]
use pulse_infra::embedding::{HttpEmbedder, HttpEmbedderConfig};
#[cfg(feature = "sqlite")]
use pulse_infra::database::{SqlitePostRepository, connect};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedService>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let posts = post_repository(&config.database).await;

        let fallback: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(config.embedding_dimension));
        let feed = FeedService::new(posts, fallback).with_settings(config.search.clone());

        #[cfg(feature = "http-embedder")]
        let feed = with_embedding_service(feed, config.embedding_service.as_ref());

        tracing::info!("Application state initialized");

        Self::from_service(feed)
    }

    pub fn from_service(feed: FeedService) -> Self {
        Self {
            feed: Arc::new(feed),
        }
    }
}

#[cfg(feature = "sqlite")]
async fn post_repository(config: &DatabaseConfig) -> Arc<dyn PostRepository> {
    match connect(config).await {
        Ok(db) => Arc::new(SqlitePostRepository::new(db)),
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to open post database. Using in-memory fallback."
            );
            Arc::new(InMemoryPostRepository::new())
        }
    }
}

#[cfg(not(feature = "sqlite"))]
async fn post_repository(_config: &DatabaseConfig) -> Arc<dyn PostRepository> {
    tracing::info!("Running without sqlite feature - using in-memory repository");
    Arc::new(InMemoryPostRepository::new())
}

#[cfg(feature = "http-embedder")]
fn with_embedding_service(feed: FeedService, config: Option<&HttpEmbedderConfig>) -> FeedService {
    let Some(config) = config else {
        tracing::warn!("EMBEDDING_SERVICE_URL not set. Using mock embeddings only.");
        return feed;
    };

    match HttpEmbedder::new(config.clone()) {
        Ok(embedder) => feed.with_primary(Arc::new(embedder)),
        Err(e) => {
            tracing::error!(
                error = %e,
                "Embedding service client unavailable. Using mock embeddings."
            );
            feed
        }
    }
}
