//! Feed service behaviour over the in-memory repository with scripted embedders.

use std::sync::Arc;

use async_trait::async_trait;

use pulse_core::domain::{Embedding, NewPost};
use pulse_core::error::DomainError;
use pulse_core::ports::{Embedder, EmbeddingError, EmbeddingOutput, PostRepository};
use pulse_core::service::{EmbeddingStatus, FeedService, SearchMode};
use pulse_infra::InMemoryPostRepository;

/// One dimension per keyword, plus a constant so no vector is all zeros.
struct KeywordEmbedder {
    model: &'static str,
}

const KEYWORDS: [&str; 3] = ["cat", "dog", "car"];

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingOutput, EmbeddingError> {
        let text = text.to_lowercase();
        let mut vector: Vec<f32> = KEYWORDS
            .iter()
            .map(|k| if text.contains(k) { 1.0 } else { 0.0 })
            .collect();
        vector.push(0.01);

        Ok(EmbeddingOutput {
            vector,
            model: self.model.to_string(),
        })
    }

    fn model_name(&self) -> &str {
        self.model
    }
}

struct DownEmbedder;

#[async_trait]
impl Embedder for DownEmbedder {
    async fn embed(&self, _text: &str) -> Result<EmbeddingOutput, EmbeddingError> {
        Err(EmbeddingError::Timeout)
    }

    fn model_name(&self) -> &str {
        "down"
    }
}

fn repo() -> Arc<dyn PostRepository> {
    Arc::new(InMemoryPostRepository::new())
}

fn keywords(model: &'static str) -> Arc<dyn Embedder> {
    Arc::new(KeywordEmbedder { model })
}

fn new_post(title: &str) -> NewPost {
    NewPost::new(title, "body", "ada").unwrap()
}

fn working(repo: Arc<dyn PostRepository>) -> FeedService {
    FeedService::new(repo, keywords("kw"))
}

fn broken(repo: Arc<dyn PostRepository>) -> FeedService {
    FeedService::new(repo, Arc::new(DownEmbedder))
}

#[tokio::test]
async fn test_create_embeds_with_primary() {
    let service = FeedService::new(repo(), keywords("fallback")).with_primary(keywords("primary"));

    let outcome = service.create_post(new_post("my cat")).await.unwrap();

    assert_eq!(
        outcome.embedding,
        EmbeddingStatus::Generated {
            model: "primary".to_string()
        }
    );
    let (vector, model) = outcome.post.embedding.vector().unwrap();
    assert_eq!(model, "primary");
    assert_eq!(vector.len(), KEYWORDS.len() + 1);
}

#[tokio::test]
async fn test_create_falls_back_when_primary_fails() {
    let service =
        FeedService::new(repo(), keywords("fallback")).with_primary(Arc::new(DownEmbedder));

    let outcome = service.create_post(new_post("my cat")).await.unwrap();

    match outcome.embedding {
        EmbeddingStatus::Fallback { model, reason } => {
            assert_eq!(model, "fallback");
            assert!(reason.contains("timed out"));
        }
        other => panic!("expected fallback, got {other:?}"),
    }
    assert!(outcome.post.embedding.is_embedded());
}

#[tokio::test]
async fn test_create_keeps_post_when_embedding_fails() {
    let service = broken(repo());

    let outcome = service.create_post(new_post("my cat")).await.unwrap();

    assert!(matches!(outcome.embedding, EmbeddingStatus::Failed { .. }));
    assert_eq!(outcome.post.embedding, Embedding::Unembedded);

    let stored = service.get_post(outcome.post.id).await.unwrap();
    assert_eq!(stored.title, "my cat");
}

#[tokio::test]
async fn test_blank_query_returns_whole_feed() {
    let service = working(repo());
    service.create_post(new_post("first")).await.unwrap();
    service.create_post(new_post("second")).await.unwrap();

    let search = service.search_feed("   ").await.unwrap();

    assert_eq!(search.mode, SearchMode::All);
    let titles: Vec<&str> = search.results.iter().map(|r| r.post.title.as_str()).collect();
    assert_eq!(titles, ["second", "first"]);
}

#[tokio::test]
async fn test_feed_search_ranks_by_similarity() {
    let service = working(repo());
    service.create_post(new_post("my dog")).await.unwrap();
    let cat = service.create_post(new_post("my cat")).await.unwrap().post;
    service.create_post(new_post("a car")).await.unwrap();

    let search = service.search_feed("cat").await.unwrap();

    assert_eq!(
        search.mode,
        SearchMode::Semantic {
            model: "kw".to_string(),
            fallback_reason: None,
        }
    );
    assert_eq!(search.results.len(), 1);
    assert_eq!(search.results[0].post.id, cat.id);
    assert!((search.results[0].score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_feed_search_uses_text_when_nothing_is_embedded() {
    let service = broken(repo());
    service.create_post(new_post("Modern Art")).await.unwrap();
    service.create_post(new_post("Cooking")).await.unwrap();

    let search = service.search_feed("art").await.unwrap();

    assert!(matches!(search.mode, SearchMode::Text { .. }));
    assert_eq!(search.results.len(), 1);
    assert_eq!(search.results[0].post.title, "Modern Art");
    assert_eq!(search.results[0].score, 0.0);
}

#[tokio::test]
async fn test_feed_search_uses_text_when_query_cannot_be_embedded() {
    let store = repo();
    working(store.clone())
        .create_post(new_post("my cat"))
        .await
        .unwrap();

    let search = broken(store).search_feed("cat").await.unwrap();

    match search.mode {
        SearchMode::Text { reason } => assert!(reason.contains("could not be embedded")),
        other => panic!("expected text mode, got {other:?}"),
    }
    assert_eq!(search.results.len(), 1);
}

#[tokio::test]
async fn test_feed_search_skips_other_models() {
    let store = repo();
    working(store.clone())
        .create_post(new_post("my cat"))
        .await
        .unwrap();

    let search = FeedService::new(store, keywords("other"))
        .search_feed("cat")
        .await
        .unwrap();

    match search.mode {
        SearchMode::Text { reason } => assert!(reason.contains("other")),
        other => panic!("expected text mode, got {other:?}"),
    }
}

#[tokio::test]
async fn test_feed_search_reports_fallback_query_embedding() {
    let service =
        FeedService::new(repo(), keywords("fallback")).with_primary(Arc::new(DownEmbedder));
    let cat = service.create_post(new_post("my cat")).await.unwrap().post;

    let search = service.search_feed("cat").await.unwrap();

    match search.mode {
        SearchMode::Semantic {
            model,
            fallback_reason: Some(reason),
        } => {
            assert_eq!(model, "fallback");
            assert!(reason.contains("timed out"));
        }
        other => panic!("expected semantic mode with a fallback reason, got {other:?}"),
    }
    assert_eq!(search.results.len(), 1);
    assert_eq!(search.results[0].post.id, cat.id);
}

#[tokio::test]
async fn test_feed_search_keeps_posts_embedded_while_primary_was_down() {
    let store = repo();
    let offline =
        FeedService::new(store.clone(), keywords("fallback")).with_primary(Arc::new(DownEmbedder));
    let my_cat = offline.create_post(new_post("my cat")).await.unwrap().post;

    let online = FeedService::new(store, keywords("fallback")).with_primary(keywords("primary"));
    let cat_food = online.create_post(new_post("cat food")).await.unwrap().post;
    online.create_post(new_post("a car")).await.unwrap();

    let search = online.search_feed("cat").await.unwrap();

    assert_eq!(
        search.mode,
        SearchMode::Semantic {
            model: "primary".to_string(),
            fallback_reason: None,
        }
    );
    let ids: Vec<_> = search.results.iter().map(|r| r.post.id).collect();
    assert_eq!(ids, [cat_food.id, my_cat.id]);
    assert!(search.results.iter().all(|r| r.score > 0.1));
}

#[tokio::test]
async fn test_feed_search_matches_text_of_unrankable_models() {
    let store = repo();
    let legacy = FeedService::new(store.clone(), keywords("legacy"))
        .create_post(new_post("old cat"))
        .await
        .unwrap()
        .post;
    FeedService::new(store.clone(), keywords("legacy"))
        .create_post(new_post("old dog"))
        .await
        .unwrap();

    let service = working(store);
    let fresh = service.create_post(new_post("new cat")).await.unwrap().post;

    let search = service.search_feed("cat").await.unwrap();

    assert!(matches!(search.mode, SearchMode::Semantic { .. }));
    let ids: Vec<_> = search.results.iter().map(|r| r.post.id).collect();
    assert_eq!(ids, [fresh.id, legacy.id]);
    assert_eq!(search.results[1].score, 0.0);
}

#[tokio::test]
async fn test_feed_search_keeps_query_whitespace() {
    let service = broken(repo());
    service.create_post(new_post("Modern Art")).await.unwrap();
    service.create_post(new_post("art class")).await.unwrap();

    let search = service.search_feed("art ").await.unwrap();

    assert!(matches!(search.mode, SearchMode::Text { .. }));
    let titles: Vec<&str> = search.results.iter().map(|r| r.post.title.as_str()).collect();
    assert_eq!(titles, ["art class"]);
}

#[tokio::test]
async fn test_feed_search_uses_text_below_threshold() {
    let service = working(repo());
    service.create_post(new_post("my cat")).await.unwrap();

    let search = service.search_feed("bird").await.unwrap();

    assert!(matches!(search.mode, SearchMode::Text { .. }));
    assert!(search.results.is_empty());
}

#[tokio::test]
async fn test_top_search_returns_best_three_without_threshold() {
    let service = working(repo());
    let cat = service.create_post(new_post("cat")).await.unwrap().post;
    let cat_dog = service.create_post(new_post("cat and dog")).await.unwrap().post;
    service.create_post(new_post("dog")).await.unwrap();
    service.create_post(new_post("car")).await.unwrap();

    let results = service.search_top("cat").await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].post.id, cat.id);
    assert_eq!(results[1].post.id, cat_dog.id);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(results[2].score < 0.1);
}

#[tokio::test]
async fn test_top_search_is_empty_without_embeddings() {
    let store = repo();
    broken(store.clone())
        .create_post(new_post("cat"))
        .await
        .unwrap();

    let results = working(store).search_top("cat").await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_top_search_fails_when_query_cannot_be_embedded() {
    let store = repo();
    working(store.clone())
        .create_post(new_post("cat"))
        .await
        .unwrap();

    let err = broken(store).search_top("cat").await.unwrap_err();
    assert!(matches!(err, DomainError::EmbeddingUnavailable(_)));
}

#[tokio::test]
async fn test_backfill_embeds_missing_posts() {
    let store = repo();
    let offline = broken(store.clone());
    offline.create_post(new_post("cat")).await.unwrap();
    offline.create_post(new_post("dog")).await.unwrap();

    let online = working(store);
    online.create_post(new_post("car")).await.unwrap();

    let report = online.backfill_embeddings().await.unwrap();
    assert_eq!(report.embedded, 2);
    assert_eq!(report.fallback, 0);
    assert_eq!(report.failed, 0);

    let stats = online.stats().await.unwrap();
    assert_eq!(stats.total_posts, 3);
    assert_eq!(stats.posts_with_embeddings, 3);
}

#[tokio::test]
async fn test_regenerate_overwrites_embedding() {
    let store = repo();
    let post = working(store.clone())
        .create_post(new_post("cat"))
        .await
        .unwrap()
        .post;

    let outcome = FeedService::new(store, keywords("v2"))
        .regenerate_embedding(post.id)
        .await
        .unwrap();

    assert_eq!(
        outcome.embedding,
        EmbeddingStatus::Generated {
            model: "v2".to_string()
        }
    );
    assert_eq!(outcome.post.embedding.vector().map(|(_, m)| m), Some("v2"));
}

#[tokio::test]
async fn test_likes_and_deletes() {
    let service = working(repo());
    let post = service.create_post(new_post("cat")).await.unwrap().post;

    service.like_post(post.id).await.unwrap();
    let liked = service.like_post(post.id).await.unwrap();
    assert_eq!(liked.likes, 2);
    assert_eq!(service.get_post(post.id).await.unwrap().likes, 2);

    service.delete_post(post.id).await.unwrap();
    assert!(matches!(
        service.delete_post(post.id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        service.like_post(post.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_posts_by_author_and_clear() {
    let service = working(repo());
    service
        .create_post(NewPost::new("one", "x", "ada").unwrap())
        .await
        .unwrap();
    service
        .create_post(NewPost::new("two", "x", "bob").unwrap())
        .await
        .unwrap();

    let by_bob = service.posts_by_author("bob").await.unwrap();
    assert_eq!(by_bob.len(), 1);
    assert_eq!(by_bob[0].title, "two");

    service.clear().await.unwrap();
    assert!(service.list_posts().await.unwrap().is_empty());
}
