//! Application configuration loaded from environment variables.

use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;

use pulse_core::service::SearchSettings;
use pulse_infra::database::DatabaseConfig;
use pulse_infra::embedding::DEFAULT_DIMENSION;

#[cfg(feature = "http-embedder")]
use pulse_infra::embedding::HttpEmbedderConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    /// Dimension of the local mock embeddings.
    pub embedding_dimension: usize,
    /// Remote embedding service, when `EMBEDDING_SERVICE_URL` is set.
    #[cfg(feature = "http-embedder")]
    pub embedding_service: Option<HttpEmbedderConfig>,
    pub search: SearchSettings,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or_else(|_| defaults.url.clone()),
            max_connections: parse_env("DB_MAX_CONNECTIONS", defaults.max_connections),
            ..defaults
        };

        let search_defaults = SearchSettings::default();
        let search = SearchSettings {
            feed_min_score: parse_env("SEARCH_MIN_SCORE", search_defaults.feed_min_score),
            api_limit: parse_env::<NonZeroUsize>("SEARCH_LIMIT", search_defaults.api_limit),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_env("PORT", 8080),
            database,
            embedding_dimension: parse_env("EMBEDDING_DIMENSION", DEFAULT_DIMENSION),
            #[cfg(feature = "http-embedder")]
            embedding_service: HttpEmbedderConfig::from_env(),
            search,
        }
    }
}

/// Parse `key`, keeping `default` when it is unset or unparsable.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
