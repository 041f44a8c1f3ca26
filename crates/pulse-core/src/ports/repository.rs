use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{NewPost, Post};
use crate::error::RepoError;

/// Generic repository trait defining the id-addressed operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Delete an entity by its ID. Fails with `RepoError::NotFound` when
    /// nothing was removed.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Post store.
///
/// Every mutation is durable before the returned future resolves.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Persist a new post, assigning its id and creation time.
    async fn create(&self, data: NewPost) -> Result<Post, RepoError>;

    /// All posts, newest first. Posts created at the same instant come out
    /// in reverse insertion order.
    async fn list_newest_first(&self) -> Result<Vec<Post>, RepoError>;

    /// Overwrite the like counter of a post.
    async fn update_likes(&self, id: Uuid, likes: u64) -> Result<(), RepoError>;

    /// Replace the embedding of a post, stamping the generation time.
    async fn update_embedding(
        &self,
        id: Uuid,
        vector: Vec<f32>,
        model: &str,
    ) -> Result<(), RepoError>;

    /// Posts that carry an embedding, newest first.
    async fn list_embedded(&self) -> Result<Vec<Post>, RepoError>;

    /// Number of stored posts.
    async fn count(&self) -> Result<u64, RepoError>;

    /// Number of posts that carry an embedding.
    async fn count_embedded(&self) -> Result<u64, RepoError>;

    /// Posts written by exactly `author`, newest first.
    async fn find_by_author(&self, author: &str) -> Result<Vec<Post>, RepoError>;

    /// Case-insensitive substring search over title, content and author.
    async fn text_search(&self, query: &str) -> Result<Vec<Post>, RepoError>;

    /// Remove every post.
    async fn clear(&self) -> Result<(), RepoError>;
}
