use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures raised by a store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no url stored under id '{0}'")]
    NotFound(String),

    #[error("storage file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not a valid mapping table: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by the HTTP handlers.
///
/// Unknown ids answer 400 rather than 404; existing clients rely on it.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Requested url not found")]
    NotFound,

    #[error(transparent)]
    Storage(StoreError),

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            other => ApiError::Storage(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::NotFound => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the client. Storage details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Storage(_) | ApiError::Internal(_) => "Internal error".to_owned(),
            other => other.to_string(),
        }
    }

    /// Server-side failures go to the log with their full detail.
    pub fn log(&self) {
        match self {
            ApiError::Storage(e) => tracing::error!("Store operation failed: {:?}", e),
            ApiError::Internal(msg) => tracing::error!("{}", msg),
            ApiError::Validation(msg) => tracing::debug!("Rejected request: {}", msg),
            ApiError::NotFound => {}
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        (self.status(), self.public_message()).into_response()
    }
}
