//! Post handlers: CRUD, likes, embeddings and the feed search.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use pulse_core::domain::NewPost;
use pulse_shared::dto::{BackfillResponse, CreatePostRequest, FeedSearchQuery, ListPostsQuery};

use super::convert;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/posts?author=
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let posts = match &query.author {
        Some(author) => state.feed.posts_by_author(author).await?,
        None => state.feed.list_posts().await?,
    };
    let body: Vec<_> = posts.into_iter().map(convert::post_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let new_post = NewPost::new(req.title, req.content, req.author)?;

    let outcome = state.feed.create_post(new_post).await?;
    Ok(HttpResponse::Created().json(convert::outcome_response(outcome)))
}

/// DELETE /api/posts
pub async fn clear_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    state.feed.clear().await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.feed.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(convert::post_response(post)))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.feed.delete_post(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{id}/like
pub async fn like_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.feed.like_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(convert::post_response(post)))
}

/// POST /api/posts/{id}/embedding
pub async fn regenerate_embedding(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let outcome = state.feed.regenerate_embedding(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(convert::outcome_response(outcome)))
}

/// POST /api/posts/embeddings/backfill
pub async fn backfill_embeddings(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let report = state.feed.backfill_embeddings().await?;
    Ok(HttpResponse::Ok().json(BackfillResponse {
        embedded: report.embedded,
        fallback: report.fallback,
        failed: report.failed,
    }))
}

/// GET /api/posts/search?q=
pub async fn search_feed(
    state: web::Data<AppState>,
    query: web::Query<FeedSearchQuery>,
) -> AppResult<HttpResponse> {
    let search = state.feed.search_feed(&query.q).await?;
    Ok(HttpResponse::Ok().json(convert::feed_search_response(search)))
}
