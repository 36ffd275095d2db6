//! Security response headers.
//!
//! A fixed set sent with every response: no MIME sniffing, no framing, no
//! referrer, no powerful browser features, and a CSP that only allows the
//! dashboard's own inline code plus the Tailwind CDN.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::config::SecurityConfig;

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

/// Precomputed security headers.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    /// Build the header set. Returns an empty set when headers are disabled
    /// or the configured CSP is not a valid header value.
    pub fn from_config(config: &SecurityConfig) -> Self {
        if !config.enable_headers {
            return Self { headers: Vec::new() };
        }

        let mut headers = vec![
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
            (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
            (
                PERMISSIONS_POLICY,
                HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
            ),
        ];

        match HeaderValue::from_str(&config.content_security_policy) {
            Ok(csp) => headers.push((header::CONTENT_SECURITY_POLICY, csp)),
            Err(e) => tracing::warn!(error = %e, "Ignoring invalid Content-Security-Policy"),
        }

        Self { headers }
    }

    /// Insert every header, replacing any value a handler set.
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in &self.headers {
            target.insert(name.clone(), value.clone());
        }
    }
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self::from_config(&SecurityConfig::default())
    }
}
