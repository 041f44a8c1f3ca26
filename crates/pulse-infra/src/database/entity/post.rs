//! Post entity for SeaORM.

use sea_orm::entity::prelude::*;

use pulse_core::domain::{Embedding, Post};
use pulse_core::error::RepoError;

/// One row per post. The three `embedding*` columns are written together
/// by a single UPDATE and are either all NULL or all set.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Insertion counter, breaks `created_at` ties.
    #[sea_orm(unique)]
    pub seq: i64,
    #[sea_orm(indexed)]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(indexed)]
    pub author: String,
    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,
    pub likes: i64,
    pub embedding: Option<Json>,
    pub embedding_model: Option<String>,
    #[sea_orm(indexed)]
    pub embedding_generated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl TryFrom<Model> for Post {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = model.id;
        let embedding = match (
            model.embedding,
            model.embedding_model,
            model.embedding_generated_at,
        ) {
            (Some(vector), Some(model_name), Some(generated_at)) => Embedding::Embedded {
                vector: serde_json::from_value(vector)
                    .map_err(|e| RepoError::Corrupt(format!("post {id}: bad embedding: {e}")))?,
                model: model_name,
                generated_at,
            },
            (None, None, None) => Embedding::Unembedded,
            _ => {
                return Err(RepoError::Corrupt(format!(
                    "post {id}: partial embedding columns"
                )));
            }
        };

        let likes = u64::try_from(model.likes)
            .map_err(|_| RepoError::Corrupt(format!("post {id}: negative likes")))?;

        Ok(Self {
            id,
            title: model.title,
            content: model.content,
            author: model.author,
            created_at: model.created_at,
            likes,
            embedding,
        })
    }
}

/// Build a complete row for `post`, bypassing `seq` assignment.
#[cfg(test)]
pub(crate) fn new_active_model(post: &Post, seq: i64) -> Result<ActiveModel, RepoError> {
    use sea_orm::Set;

    let likes = i64::try_from(post.likes)
        .map_err(|_| RepoError::Constraint("likes out of range".to_string()))?;

    let (embedding, embedding_model, embedding_generated_at) = match &post.embedding {
        Embedding::Embedded {
            vector,
            model,
            generated_at,
        } => (
            Some(vector_to_json(vector)?),
            Some(model.clone()),
            Some(*generated_at),
        ),
        Embedding::Unembedded => (None, None, None),
    };

    Ok(ActiveModel {
        id: Set(post.id),
        seq: Set(seq),
        title: Set(post.title.clone()),
        content: Set(post.content.clone()),
        author: Set(post.author.clone()),
        created_at: Set(post.created_at),
        likes: Set(likes),
        embedding: Set(embedding),
        embedding_model: Set(embedding_model),
        embedding_generated_at: Set(embedding_generated_at),
    })
}

pub(crate) fn vector_to_json(vector: &[f32]) -> Result<Json, RepoError> {
    serde_json::to_value(vector).map_err(|e| RepoError::Constraint(e.to_string()))
}
