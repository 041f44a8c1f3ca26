//! Feed service.
//!
//! Orchestrates the post lifecycle on top of a [`PostRepository`]:
//! creating posts and attaching embeddings, likes, and the two search
//! paths. Embedding failures degrade results but never block a write;
//! every degradation is reported back to the caller.

use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{NewPost, Post};
use crate::error::DomainError;
use crate::ports::{
    BaseRepository, Embedder, EmbeddingError, EmbeddingOutput, PostRepository,
};
use crate::ranking::{self, Ranked};

const DEFAULT_API_LIMIT: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(limit) => limit,
    None => NonZeroUsize::MIN,
};

/// Search tuning.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Feed search drops posts scoring at or below this.
    pub feed_min_score: f64,
    /// Number of results returned by the top-K search.
    pub api_limit: NonZeroUsize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            feed_min_score: 0.1,
            api_limit: DEFAULT_API_LIMIT,
        }
    }
}

/// How a post's embedding came to be.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmbeddingStatus {
    /// Produced by the configured embedder.
    Generated { model: String },
    /// The primary embedder failed; the local fallback produced it.
    Fallback { model: String, reason: String },
    /// No embedding was stored. The post is only reachable by text search.
    Failed { reason: String },
}

/// A post and the outcome of embedding it.
#[derive(Debug, Clone)]
pub struct PostOutcome {
    pub post: Post,
    pub embedding: EmbeddingStatus,
}

/// A post with its similarity to a search query.
#[derive(Debug, Clone)]
pub struct ScoredPost {
    pub post: Post,
    pub score: f64,
}

/// Which strategy answered a feed search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SearchMode {
    /// Blank query: the whole feed.
    All,
    /// Vector ranking. `fallback_reason` is set when the query vector came
    /// from the fallback embedder.
    Semantic {
        model: String,
        fallback_reason: Option<String>,
    },
    /// Substring matching, with the reason semantic search was skipped.
    Text { reason: String },
}

#[derive(Debug, Clone)]
pub struct FeedSearch {
    pub mode: SearchMode,
    pub results: Vec<ScoredPost>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub embedded: usize,
    pub fallback: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub total_posts: u64,
    pub posts_with_embeddings: u64,
}

#[derive(Debug, Clone, Copy)]
enum EmbedRequest<'a> {
    Post { title: &'a str, content: &'a str },
    Query(&'a str),
}

impl EmbedRequest<'_> {
    async fn run(self, embedder: &dyn Embedder) -> Result<EmbeddingOutput, EmbeddingError> {
        match self {
            EmbedRequest::Post { title, content } => embedder.embed_post(title, content).await,
            EmbedRequest::Query(text) => embedder.embed(text).await,
        }
    }
}

struct Sourced {
    output: EmbeddingOutput,
    fallback_reason: Option<String>,
}

impl Sourced {
    fn status(&self) -> EmbeddingStatus {
        let model = self.output.model.clone();
        match &self.fallback_reason {
            Some(reason) => EmbeddingStatus::Fallback {
                model,
                reason: reason.clone(),
            },
            None => EmbeddingStatus::Generated { model },
        }
    }
}

/// Feed operations over an injected repository and embedders.
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    primary: Option<Arc<dyn Embedder>>,
    fallback: Arc<dyn Embedder>,
    settings: SearchSettings,
}

impl FeedService {
    /// Create a service whose only embedder is `fallback`.
    pub fn new(posts: Arc<dyn PostRepository>, fallback: Arc<dyn Embedder>) -> Self {
        Self {
            posts,
            primary: None,
            fallback,
            settings: SearchSettings::default(),
        }
    }

    /// Try `embedder` first and use the fallback only when it fails.
    pub fn with_primary(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.primary = Some(embedder);
        self
    }

    pub fn with_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Persist a post, then embed it.
    ///
    /// The post is stored before any embedding work starts, so a failing
    /// embedder only shows up in the returned status.
    pub async fn create_post(&self, data: NewPost) -> Result<PostOutcome, DomainError> {
        let post = self.posts.create(data).await?;
        tracing::info!(post_id = %post.id, author = %post.author, "Post created");

        Ok(self.attach_embedding(post).await)
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        Ok(self.posts.list_newest_first().await?)
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    pub async fn posts_by_author(&self, author: &str) -> Result<Vec<Post>, DomainError> {
        Ok(self.posts.find_by_author(author).await?)
    }

    /// Add one like to a post.
    pub async fn like_post(&self, id: Uuid) -> Result<Post, DomainError> {
        let mut post = self.get_post(id).await?;
        let likes = post
            .likes
            .checked_add(1)
            .ok_or_else(|| DomainError::Validation("like counter overflow".to_string()))?;

        self.posts
            .update_likes(id, likes)
            .await
            .map_err(|e| DomainError::from_repo_for_post(id, e))?;

        post.likes = likes;
        tracing::debug!(post_id = %id, likes, "Post liked");
        Ok(post)
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<(), DomainError> {
        self.posts
            .delete(id)
            .await
            .map_err(|e| DomainError::from_repo_for_post(id, e))?;
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), DomainError> {
        self.posts.clear().await?;
        tracing::warn!("All posts cleared");
        Ok(())
    }

    /// Embed a post again, replacing whatever embedding it had.
    pub async fn regenerate_embedding(&self, id: Uuid) -> Result<PostOutcome, DomainError> {
        let post = self.get_post(id).await?;
        let sourced = self
            .embed(EmbedRequest::Post {
                title: &post.title,
                content: &post.content,
            })
            .await?;

        let embedding = sourced.status();
        let post = self
            .store_embedding(id, sourced.output.vector, &sourced.output.model)
            .await?;

        Ok(PostOutcome { post, embedding })
    }

    /// Embed every post that has no embedding yet.
    pub async fn backfill_embeddings(&self) -> Result<BackfillReport, DomainError> {
        let pending: Vec<Post> = self
            .posts
            .list_newest_first()
            .await?
            .into_iter()
            .filter(|post| !post.embedding.is_embedded())
            .collect();

        tracing::info!(count = pending.len(), "Generating embeddings for posts");

        let mut report = BackfillReport::default();
        for post in pending {
            match self.attach_embedding(post).await.embedding {
                EmbeddingStatus::Generated { .. } => report.embedded += 1,
                EmbeddingStatus::Fallback { .. } => report.fallback += 1,
                EmbeddingStatus::Failed { .. } => report.failed += 1,
            }
        }

        Ok(report)
    }

    /// Feed search.
    ///
    /// Ranks every comparable post above `feed_min_score`. Posts embedded
    /// by the fallback while the primary was down are ranked against a
    /// fallback query vector and merged in. Falls back to substring search
    /// whenever the semantic path has nothing to offer.
    pub async fn search_feed(&self, query: &str) -> Result<FeedSearch, DomainError> {
        if query.trim().is_empty() {
            let posts = self.posts.list_newest_first().await?;
            return Ok(FeedSearch {
                mode: SearchMode::All,
                results: unscored(posts),
            });
        }

        let embedded = self.posts.list_embedded().await?;
        let Some(limit) = NonZeroUsize::new(embedded.len()) else {
            return self.text_fallback(query, "no posts have embeddings").await;
        };

        let embedded_query = self.embed(EmbedRequest::Query(query)).await;
        let sourced = match embedded_query {
            Ok(sourced) => sourced,
            Err(e) => {
                return self
                    .text_fallback(query, format!("query could not be embedded: {e}"))
                    .await;
            }
        };

        let min_score = self.settings.feed_min_score;
        let mut compared = vec![sourced.output.model.clone()];
        let mut ranked = rank_comparable(&sourced.output, &embedded, limit, Some(min_score))?;

        if let Some(extra_query) = self.fallback_query(query, &sourced.output, &embedded).await {
            let extra = rank_comparable(&extra_query, &embedded, limit, Some(min_score))?;
            compared.push(extra_query.model);
            ranked = merge_ranked(ranked, extra);
        }

        let Some(mut ranked) = ranked else {
            let reason = format!("no posts embedded with model {}", sourced.output.model);
            return self.text_fallback(query, reason).await;
        };

        // Posts from models no embedder here can reproduce stay reachable
        // through their text.
        let needle = query.to_lowercase();
        ranked.extend(
            embedded
                .iter()
                .enumerate()
                .filter(|(_, post)| {
                    post.embedding
                        .vector()
                        .is_some_and(|(_, model)| !compared.iter().any(|m| m == model))
                        && post.matches_text(&needle)
                })
                .map(|(key, _)| Ranked { key, score: 0.0 }),
        );

        if ranked.is_empty() {
            let reason = format!("no post scored above {min_score}");
            return self.text_fallback(query, reason).await;
        }

        tracing::debug!(
            query_len = query.len(),
            results = ranked.len(),
            model = %sourced.output.model,
            "Semantic feed search"
        );

        Ok(FeedSearch {
            mode: SearchMode::Semantic {
                model: sourced.output.model,
                fallback_reason: sourced.fallback_reason,
            },
            results: join(embedded, ranked),
        })
    }

    /// Top-K semantic search with no score threshold.
    ///
    /// Returns nothing when no post has an embedding. Unlike the feed
    /// search, failing to embed the query is an error.
    pub async fn search_top(&self, query: &str) -> Result<Vec<ScoredPost>, DomainError> {
        let embedded = self.posts.list_embedded().await?;
        if embedded.is_empty() {
            return Ok(Vec::new());
        }

        let sourced = self.embed(EmbedRequest::Query(query)).await?;
        let ranked = rank_comparable(&sourced.output, &embedded, self.settings.api_limit, None)?
            .unwrap_or_default();

        Ok(join(embedded, ranked))
    }

    pub async fn stats(&self) -> Result<FeedStats, DomainError> {
        Ok(FeedStats {
            total_posts: self.posts.count().await?,
            posts_with_embeddings: self.posts.count_embedded().await?,
        })
    }

    async fn embed(&self, request: EmbedRequest<'_>) -> Result<Sourced, EmbeddingError> {
        let mut fallback_reason = None;

        if let Some(primary) = &self.primary {
            match request.run(primary.as_ref()).await {
                Ok(output) => {
                    return Ok(Sourced {
                        output,
                        fallback_reason: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        model = %primary.model_name(),
                        error = %e,
                        "Primary embedder failed, using fallback"
                    );
                    fallback_reason = Some(e.to_string());
                }
            }
        }

        let output = request.run(self.fallback.as_ref()).await?;
        Ok(Sourced {
            output,
            fallback_reason,
        })
    }

    /// Embed the query with the fallback as well, when some posts carry
    /// the fallback's model but the main query vector came from another.
    async fn fallback_query(
        &self,
        query: &str,
        main: &EmbeddingOutput,
        posts: &[Post],
    ) -> Option<EmbeddingOutput> {
        let model = self.fallback.model_name();
        let needed = main.model != model
            && posts
                .iter()
                .any(|post| post.embedding.vector().is_some_and(|(_, m)| m == model));
        if !needed {
            return None;
        }

        match self.fallback.embed(query).await {
            Ok(output) => Some(output),
            Err(e) => {
                tracing::warn!(%model, error = %e, "Fallback query embedding failed");
                None
            }
        }
    }

    async fn attach_embedding(&self, post: Post) -> PostOutcome {
        let embedded = self
            .embed(EmbedRequest::Post {
                title: &post.title,
                content: &post.content,
            })
            .await;

        let sourced = match embedded {
            Ok(sourced) => sourced,
            Err(e) => {
                tracing::warn!(post_id = %post.id, error = %e, "No embedding generated");
                return PostOutcome {
                    post,
                    embedding: EmbeddingStatus::Failed {
                        reason: e.to_string(),
                    },
                };
            }
        };

        let embedding = sourced.status();
        let stored = self
            .store_embedding(post.id, sourced.output.vector, &sourced.output.model)
            .await;

        match stored {
            Ok(updated) => PostOutcome {
                post: updated,
                embedding,
            },
            Err(e) => {
                tracing::error!(post_id = %post.id, error = %e, "Failed to store embedding");
                PostOutcome {
                    post,
                    embedding: EmbeddingStatus::Failed {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    async fn store_embedding(
        &self,
        id: Uuid,
        vector: Vec<f32>,
        model: &str,
    ) -> Result<Post, DomainError> {
        self.posts
            .update_embedding(id, vector, model)
            .await
            .map_err(|e| DomainError::from_repo_for_post(id, e))?;
        self.get_post(id).await
    }

    async fn text_fallback(
        &self,
        query: &str,
        reason: impl Into<String>,
    ) -> Result<FeedSearch, DomainError> {
        let reason = reason.into();
        tracing::info!(%reason, "Falling back to text search");

        let posts = self.posts.text_search(query).await?;
        Ok(FeedSearch {
            mode: SearchMode::Text { reason },
            results: unscored(posts),
        })
    }
}

/// Rank posts embedded with the query's model. `None` when there are none.
fn rank_comparable(
    query: &EmbeddingOutput,
    posts: &[Post],
    limit: NonZeroUsize,
    min_score: Option<f64>,
) -> Result<Option<Vec<Ranked<usize>>>, DomainError> {
    let candidates: Vec<(usize, &[f32])> = posts
        .iter()
        .enumerate()
        .filter_map(|(index, post)| match post.embedding.vector() {
            Some((vector, model)) if model == query.model => Some((index, vector)),
            _ => None,
        })
        .collect();

    if candidates.is_empty() {
        return Ok(None);
    }

    ranking::rank(&query.vector, candidates, limit, min_score).map(Some)
}

/// Combine rankings from different query vectors, best score first.
fn merge_ranked(
    a: Option<Vec<Ranked<usize>>>,
    b: Option<Vec<Ranked<usize>>>,
) -> Option<Vec<Ranked<usize>>> {
    if a.is_none() && b.is_none() {
        return None;
    }

    let mut merged: Vec<Ranked<usize>> = a.into_iter().chain(b).flatten().collect();
    merged.sort_by(|x, y| y.score.total_cmp(&x.score));
    Some(merged)
}

/// Re-attach ranked indices to the posts they point at.
fn join(posts: Vec<Post>, ranked: Vec<Ranked<usize>>) -> Vec<ScoredPost> {
    let mut slots: Vec<Option<Post>> = posts.into_iter().map(Some).collect();
    ranked
        .into_iter()
        .filter_map(|r| {
            slots
                .get_mut(r.key)
                .and_then(Option::take)
                .map(|post| ScoredPost {
                    post,
                    score: r.score,
                })
        })
        .collect()
}

fn unscored(posts: Vec<Post>) -> Vec<ScoredPost> {
    posts
        .into_iter()
        .map(|post| ScoredPost { post, score: 0.0 })
        .collect()
}
