//! Router assembly.

mod common;
mod entity;

pub use common::common_routes;
pub use entity::entity_routes;

use crate::state::AppState;
use axum::body::Body;
use axum::http::header;
use axum::middleware::map_response;
use axum::response::Response;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// The full application: operational routes, entity routes, request tracing and a body size cap.
pub fn app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(entity_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(map_response(empty_client_error_body))
        .layer(TraceLayer::new_for_http())
}

/// Client errors go out with an empty body, including rejections raised by extractors and
/// layers before a handler runs.
async fn empty_client_error_body(response: Response) -> Response {
    if !response.status().is_client_error() {
        return response;
    }
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::empty())
}
