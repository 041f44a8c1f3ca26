//! Request ID middleware - tags every request with a unique ID.

use std::future::{Ready, ready};

use actix_web::{
    Error, HttpMessage, HttpResponse, ResponseError,
    body::{BoxBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue},
    middleware::Next,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::middleware::error::AppError;

/// Header name for request ID.
pub static REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied ID that is accepted as-is.
const MAX_CLIENT_ID_LEN: usize = 128;

/// Request ID, available to handlers as an extractor.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl actix_web::FromRequest for RequestId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId(Uuid::new_v4().to_string()));

        ready(Ok(request_id))
    }
}

/// Reuse the caller's ID (client or load balancer) or generate one, run
/// the request inside a span carrying it, and echo it in the response.
///
/// `AppError` bodies are rebuilt so the problem details name the request.
pub async fn request_id(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_CLIENT_ID_LEN)
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(request_id.clone()));
    let path = req.path().to_string();

    let span = tracing::info_span!("request", request_id = %request_id);
    let res = next.call(req).instrument(span).await?;

    let problem = res
        .response()
        .error()
        .and_then(|e| e.as_error::<AppError>())
        .map(|app_err| {
            let body = app_err
                .problem()
                .with_instance(path)
                .with_request_id(request_id.as_str());
            HttpResponse::build(app_err.status_code()).json(body)
        });

    let mut res = match problem {
        Some(response) => res.into_response(response),
        None => res.map_into_boxed_body(),
    };

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        res.headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    Ok(res)
}
