//! Error injection endpoints and routing fallbacks.

use axum::http::Uri;

use crate::http::error::ApiError;

/// `GET /error/404`: a deliberate, client-facing not-found.
pub async fn error_404() -> Result<(), ApiError> {
    Err(ApiError::NotFound("simulated_not_found".to_string()))
}

/// `GET /error/500`: an unexpected fault the pipeline must hide.
pub async fn error_500() -> Result<(), ApiError> {
    Err(ApiError::Internal("simulated_internal_error".to_string()))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
