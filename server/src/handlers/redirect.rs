use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{error::ApiError, store::Unwrapper, AppState};

/// GET /:id
///
/// Looks the id up in the store and answers 307 with the original URL in
/// `Location`. Unknown ids get a 400 and no `Location`.
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let original_url = state.store.unwrap_url(&id).await?;

    let location = HeaderValue::from_str(&original_url).map_err(|_| {
        ApiError::Internal(format!(
            "Stored url for '{id}' is not a valid Location header"
        ))
    })?;

    tracing::debug!("Redirecting '{}' to {}", id, original_url);
    Ok((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response())
}
