//! HTTP handlers and route configuration.

mod convert;
mod health;
mod posts;
mod search;
mod stats;

use actix_web::{HttpRequest, error::JsonPayloadError, web};

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health::health_check))
                .route("/stats", web::get().to(stats::stats))
                .route("/search", web::post().to(search::search))
                // Literal paths before `/{id}`
                .service(
                    web::scope("/posts")
                        .route("", web::get().to(posts::list_posts))
                        .route("", web::post().to(posts::create_post))
                        .route("", web::delete().to(posts::clear_posts))
                        .route("/search", web::get().to(posts::search_feed))
                        .route(
                            "/embeddings/backfill",
                            web::post().to(posts::backfill_embeddings),
                        )
                        .route("/{id}", web::get().to(posts::get_post))
                        .route("/{id}", web::delete().to(posts::delete_post))
                        .route("/{id}/like", web::post().to(posts::like_post))
                        .route(
                            "/{id}/embedding",
                            web::post().to(posts::regenerate_embedding),
                        ),
                ),
        );
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}
