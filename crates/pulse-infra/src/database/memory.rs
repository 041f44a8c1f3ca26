//! In-memory post repository - used when no database is configured.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use pulse_core::domain::{Embedding, NewPost, Post};
use pulse_core::error::RepoError;
use pulse_core::ports::{BaseRepository, PostRepository};

/// In-memory post store backed by a `Vec` behind an async RwLock.
///
/// The vector is kept in insertion order.
/// Note: Data is lost on process restart.
pub struct InMemoryPostRepository {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
        }
    }

    async fn newest_first_where(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let posts = self.posts.read().await;
        let mut selected: Vec<Post> = posts
            .iter()
            .rev()
            .filter(|post| keep(*post))
            .cloned()
            .collect();
        // Stable sort over reverse insertion order: later inserts win ties.
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        selected
    }

    async fn modify(&self, id: Uuid, apply: impl FnOnce(&mut Post)) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        apply(post);
        Ok(())
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, data: NewPost) -> Result<Post, RepoError> {
        let post = Post::new(data);
        self.posts.write().await.push(post.clone());
        Ok(post)
    }

    async fn list_newest_first(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.newest_first_where(|_| true).await)
    }

    async fn update_likes(&self, id: Uuid, likes: u64) -> Result<(), RepoError> {
        self.modify(id, |post| post.likes = likes).await
    }

    async fn update_embedding(
        &self,
        id: Uuid,
        vector: Vec<f32>,
        model: &str,
    ) -> Result<(), RepoError> {
        let model = model.to_string();
        self.modify(id, move |post| {
            post.embedding = Embedding::Embedded {
                vector,
                model,
                generated_at: Utc::now(),
            };
        })
        .await
    }

    async fn list_embedded(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self
            .newest_first_where(|p| p.embedding.is_embedded())
            .await)
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.posts.read().await.len() as u64)
    }

    async fn count_embedded(&self) -> Result<u64, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().filter(|p| p.embedding.is_embedded()).count() as u64)
    }

    async fn find_by_author(&self, author: &str) -> Result<Vec<Post>, RepoError> {
        Ok(self.newest_first_where(|p| p.author == author).await)
    }

    async fn text_search(&self, query: &str) -> Result<Vec<Post>, RepoError> {
        let needle = query.to_lowercase();
        Ok(self.newest_first_where(|p| p.matches_text(&needle)).await)
    }

    async fn clear(&self) -> Result<(), RepoError> {
        self.posts.write().await.clear();
        Ok(())
    }
}
