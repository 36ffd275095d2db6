//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the showcase service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Per-client rate limiting.
    pub rate_limit: RateLimitConfig,

    /// In-process request metrics.
    pub metrics: MetricsConfig,

    /// Outbound HTTP calls made by `/slow` and `/external`.
    pub outbound: OutboundConfig,

    /// `/download` sizing.
    pub download: DownloadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Security hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Maximum requests per client per window.
    pub max_requests: u32,

    /// How often stale buckets are swept, in seconds. Zero disables the sweep.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 60,
            max_requests: 60,
            sweep_interval_secs: 300,
        }
    }
}

/// Request metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Number of latency samples kept for percentile statistics.
    pub latency_history: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            latency_history: 500,
        }
    }
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutboundConfig {
    /// Total timeout for a single outbound request, in seconds.
    pub timeout_secs: u64,

    /// URL fetched by `POST /slow` in http mode when none is given.
    pub slow_default_url: String,

    /// URL fetched by `GET /external` when none is given.
    pub external_default_url: String,
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            slow_default_url: "https://httpbin.org/delay/1".to_string(),
            external_default_url: "https://httpbin.org/get".to_string(),
        }
    }
}

/// Download endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Size used when the request has no `size` parameter.
    pub default_bytes: u64,

    /// Upper clamp for the generated payload.
    pub max_bytes: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            default_bytes: 1024,
            max_bytes: 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Expose a Prometheus scrape endpoint.
    pub prometheus_enabled: bool,

    /// Prometheus endpoint bind address.
    pub prometheus_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "deploy_showcase=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            prometheus_enabled: false,
            prometheus_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Attach the fixed security response headers.
    pub enable_headers: bool,
    /// Maximum request body size in bytes. Uploads are streamed, so this only
    /// guards against unbounded bodies.
    pub max_body_size: usize,
    /// Content-Security-Policy sent with every response.
    pub content_security_policy: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 64 * 1024 * 1024, // 64MB
            content_security_policy: "default-src 'self'; img-src 'self' data:; \
                script-src 'self' https://cdn.tailwindcss.com 'unsafe-inline'; \
                style-src 'self' 'unsafe-inline'"
                .to_string(),
        }
    }
}
