//! SQLite post repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
    Statement, Value,
};
use uuid::Uuid;

use pulse_core::domain::{NewPost, Post};
use pulse_core::error::RepoError;
use pulse_core::ports::PostRepository;

use super::entity::post::{self, Entity as PostEntity};
use super::sql_base::{SqlBaseRepository, repo_err};

/// SQLite post repository.
pub type SqlitePostRepository = SqlBaseRepository<PostEntity>;

/// Reads `MAX(seq)` and writes in one statement. SQLite takes the write
/// lock before the read, so concurrent creates queue on the busy timeout
/// instead of failing on a lock upgrade.
const INSERT_WITH_NEXT_SEQ: &str = "INSERT INTO posts \
    (id, seq, title, content, author, created_at, likes) \
    SELECT ?, COALESCE(MAX(seq), 0) + 1, ?, ?, ?, ?, ? FROM posts";

fn newest_first() -> Select<PostEntity> {
    PostEntity::find()
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Seq)
}

fn into_posts(models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
    models.into_iter().map(Post::try_from).collect()
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn create(&self, data: NewPost) -> Result<Post, RepoError> {
        let post = Post::new(data);
        let likes = i64::try_from(post.likes)
            .map_err(|_| RepoError::Constraint("likes out of range".to_string()))?;

        let insert = Statement::from_sql_and_values(
            self.db.get_database_backend(),
            INSERT_WITH_NEXT_SEQ,
            [
                Value::from(post.id),
                Value::from(post.title.clone()),
                Value::from(post.content.clone()),
                Value::from(post.author.clone()),
                Value::from(post.created_at),
                Value::from(likes),
            ],
        );
        self.db.execute(insert).await.map_err(repo_err)?;

        tracing::debug!(post_id = %post.id, "Inserted post");
        Ok(post)
    }

    async fn list_newest_first(&self) -> Result<Vec<Post>, RepoError> {
        let models = newest_first().all(&self.db).await.map_err(repo_err)?;
        into_posts(models)
    }

    async fn update_likes(&self, id: Uuid, likes: u64) -> Result<(), RepoError> {
        let likes = i64::try_from(likes)
            .map_err(|_| RepoError::Constraint("likes out of range".to_string()))?;

        let result = PostEntity::update_many()
            .col_expr(post::Column::Likes, Expr::value(likes))
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn update_embedding(
        &self,
        id: Uuid,
        vector: Vec<f32>,
        model: &str,
    ) -> Result<(), RepoError> {
        let dimension = vector.len();
        let vector = post::vector_to_json(&vector)?;

        // One statement, so the three columns never disagree.
        let result = PostEntity::update_many()
            .col_expr(post::Column::Embedding, Expr::value(vector))
            .col_expr(post::Column::EmbeddingModel, Expr::value(model))
            .col_expr(post::Column::EmbeddingGeneratedAt, Expr::value(Utc::now()))
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        tracing::debug!(post_id = %id, model, dimension, "Stored embedding");
        Ok(())
    }

    async fn list_embedded(&self) -> Result<Vec<Post>, RepoError> {
        let models = newest_first()
            .filter(post::Column::EmbeddingGeneratedAt.is_not_null())
            .all(&self.db)
            .await
            .map_err(repo_err)?;
        into_posts(models)
    }

    async fn count(&self) -> Result<u64, RepoError> {
        PostEntity::find().count(&self.db).await.map_err(repo_err)
    }

    async fn count_embedded(&self) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::EmbeddingGeneratedAt.is_not_null())
            .count(&self.db)
            .await
            .map_err(repo_err)
    }

    async fn find_by_author(&self, author: &str) -> Result<Vec<Post>, RepoError> {
        let models = newest_first()
            .filter(post::Column::Author.eq(author))
            .all(&self.db)
            .await
            .map_err(repo_err)?;
        into_posts(models)
    }

    async fn text_search(&self, query: &str) -> Result<Vec<Post>, RepoError> {
        // SQLite LIKE only folds ASCII case, so matching happens here.
        let needle = query.to_lowercase();
        let posts = self.list_newest_first().await?;
        Ok(posts
            .into_iter()
            .filter(|post| post.matches_text(&needle))
            .collect())
    }

    async fn clear(&self) -> Result<(), RepoError> {
        let result = PostEntity::delete_many()
            .exec(&self.db)
            .await
            .map_err(repo_err)?;
        tracing::info!(removed = result.rows_affected, "Cleared posts table");
        Ok(())
    }
}
