//! Top-K semantic search endpoint.
//!
//! Errors use a plain `{error}` body rather than problem details.

use actix_web::{HttpResponse, web};
use serde_json::Value;

use pulse_shared::dto::{SearchErrorResponse, SearchResponse};

use super::convert;
use crate::observability::RequestId;
use crate::state::AppState;

const INVALID_QUERY: &str = "Query is required and must be a string";

/// POST /api/search
pub async fn search(
    state: web::Data<AppState>,
    request_id: RequestId,
    body: web::Bytes,
) -> HttpResponse {
    let Some(query) = parse_query(&body) else {
        return HttpResponse::BadRequest().json(SearchErrorResponse::new(INVALID_QUERY));
    };

    match state.feed.search_top(&query).await {
        Ok(results) => HttpResponse::Ok().json(SearchResponse {
            results: results.into_iter().map(convert::scored_response).collect(),
        }),
        Err(e) => {
            tracing::error!(
                request_id = %request_id.as_str(),
                error = %e,
                "Error in semantic search"
            );
            HttpResponse::InternalServerError()
                .json(SearchErrorResponse::new("Internal server error during search"))
        }
    }
}

/// `query` must be present, a string, and non-empty.
fn parse_query(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("query")? {
        Value::String(query) if !query.is_empty() => Some(query.clone()),
        _ => None,
    }
}
