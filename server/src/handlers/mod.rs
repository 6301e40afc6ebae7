use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod redirect;
pub mod shorten;

/// Build the public router over the given state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(shorten::shorten_text))
        .route("/api/shorten", post(shorten::shorten_json))
        // Process supervisors poll this; no store access.
        .route("/health", get(|| async { StatusCode::OK }))
        // Short-link redirect, matched after the fixed routes above
        .route("/:id", get(redirect::redirect))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Media type of a request, lower-cased, without parameters.
pub(crate) fn media_type(headers: &axum::http::HeaderMap) -> String {
    headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}
