//! Request pipeline middleware.
//!
//! ```text
//! request
//!     → rate limit check (429 short-circuit, not recorded)
//!     → timer start
//!     → body limit, handler (errors and panics already translated to responses)
//!     → 413 from the body limit rewritten as JSON
//!     → record path + elapsed in RequestMetrics and the metrics facade
//!     → X-RateLimit-*, security headers, X-Response-Time-Ms
//! ```

use std::any::Any;
use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, State},
    http::{HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::rate_limit::{RateDecision, UNKNOWN_CLIENT};

pub const X_RESPONSE_TIME_MS: HeaderName = HeaderName::from_static("x-response-time-ms");

/// Middleware applied to every route and fallback.
pub async fn request_pipeline(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let client = client_key(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request.request_id().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    // 1. Rate limit
    let decision = state.limiter.as_ref().map(|limiter| limiter.check(&client));
    if let Some(decision) = decision.filter(|d| d.blocked) {
        tracing::warn!(
            request_id = %request_id,
            client = %client,
            path = %path,
            reset_secs = decision.reset_secs,
            "Rate limit exceeded"
        );
        metrics::record_rate_limited("fixed_window");
        let mut response = ApiError::RateLimited.into_response();
        decorate(&state, &mut response, Some(&decision), elapsed_ms(start));
        return response;
    }

    // 2. Handler
    let mut response = next.run(request).await;
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // Body limit rejections come back as plain text.
        response = ApiError::PayloadTooLarge.into_response();
    }

    // 3. Record
    let elapsed = elapsed_ms(start);
    let status = response.status();
    state.metrics.record(&path, elapsed);
    metrics::record_request(method.as_str(), status.as_u16(), &route, start);

    decorate(&state, &mut response, decision.as_ref(), elapsed);

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = status.as_u16(),
        elapsed_ms = %format_args!("{:.2}", elapsed),
        "Request completed"
    );

    response
}

/// Translate a handler panic into the generic 500 body.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}

/// Rate-limit key: the peer IP, or a shared fallback when unknown.
fn client_key(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn decorate(state: &AppState, response: &mut Response, decision: Option<&RateDecision>, elapsed: f64) {
    let headers = response.headers_mut();
    if let Some(decision) = decision {
        decision.apply_headers(headers);
    }
    state.security_headers.apply(headers);
    if let Ok(value) = HeaderValue::from_str(&format!("{:.2}", elapsed)) {
        headers.insert(X_RESPONSE_TIME_MS, value);
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
