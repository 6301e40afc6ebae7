use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::media_type;
use crate::{
    error::ApiError,
    models::{ShrinkRequest, ShrinkResult},
    store::Shrinker,
    AppState,
};

// ── Handlers ───────────────────────────────────────────────────────────────

/// POST /
///
/// Body is the URL itself as `text/plain`; answers 201 with the short URL as
/// plain text.
pub async fn shorten_text(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let content_type = media_type(&headers);
    if content_type != "text/plain" {
        return Err(unsupported(&content_type));
    }

    let body = body.map_err(unreadable)?;
    let url = std::str::from_utf8(&body)
        .map_err(|_| ApiError::Validation("Request body is not valid UTF-8".into()))?;
    let url = validate_url(url)?;

    let short_url = state.store.shrink(url).await?;
    tracing::info!("Shortened {} -> {}", url, short_url);

    Ok((StatusCode::CREATED, short_url).into_response())
}

/// POST /api/shorten
///
/// Body is `{"url": "..."}` as `application/json`; answers 201 with
/// `{"result": "<short url>"}`. Errors come back as `{"error": "..."}`.
pub async fn shorten_json(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let outcome = match body {
        Ok(body) => shorten_json_inner(&state, &headers, &body).await,
        Err(rejection) => Err(unreadable(rejection)),
    };

    match outcome {
        Ok(result) => (StatusCode::CREATED, Json(result)).into_response(),
        Err(e) => {
            e.log();
            (e.status(), Json(json!({ "error": e.public_message() }))).into_response()
        }
    }
}

async fn shorten_json_inner(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<ShrinkResult, ApiError> {
    let content_type = media_type(headers);
    if content_type != "application/json" {
        return Err(unsupported(&content_type));
    }

    let request: ShrinkRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("Malformed request body: {e}")))?;
    let url = validate_url(&request.url)?;

    let short_url = state.store.shrink(url).await?;
    tracing::info!("Shortened {} -> {}", url, short_url);

    Ok(ShrinkResult { result: short_url })
}

// ── Private helpers ────────────────────────────────────────────────────────

fn unsupported(content_type: &str) -> ApiError {
    ApiError::Validation(format!("Unsupported content type: {content_type}"))
}

/// Oversized or broken bodies are client errors like any other bad input.
fn unreadable(rejection: BytesRejection) -> ApiError {
    ApiError::Validation(format!("Request body could not be read: {}", rejection.body_text()))
}

/// The stored URL later becomes a `Location` header, so it must survive
/// that trip.
fn validate_url(raw: &str) -> Result<&str, ApiError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(ApiError::Validation("URL must not be empty".into()));
    }
    if url.chars().any(char::is_control) {
        return Err(ApiError::Validation(
            "URL must not contain control characters".into(),
        ));
    }
    Ok(url)
}
