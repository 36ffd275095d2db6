//! Handler error type and its HTTP translation.
//!
//! Client-facing kinds keep their status and code. Everything unexpected is
//! logged with detail and surfaced as a bare `500 {"error":"internal_error"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("unprocessable request: {0}")]
    Unprocessable(&'static str),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code returned in the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::RateLimited => "rate_limited",
            ApiError::BadRequest(code) | ApiError::Unprocessable(code) => code,
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::Upstream(_) | ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Unhandled handler failure");
        } else {
            tracing::debug!(error = %self, status = %status, "Client error");
        }
        (status, Json(json!({ "error": self.code() }))).into_response()
    }
}
