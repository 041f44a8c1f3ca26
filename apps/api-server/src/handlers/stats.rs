//! Feed statistics endpoint.

use actix_web::{HttpResponse, web};

use pulse_shared::dto::StatsResponse;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/stats
pub async fn stats(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let stats = state.feed.stats().await?;
    Ok(HttpResponse::Ok().json(StatsResponse {
        total_posts: stats.total_posts,
        posts_with_embeddings: stats.posts_with_embeddings,
    }))
}
