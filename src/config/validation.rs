//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and addresses.
//! All problems are collected so a bad file is reported in one pass.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("download.default_bytes ({default}) exceeds download.max_bytes ({max})")]
    DownloadDefaultTooLarge { default: u64, max: u64 },
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.window_secs" });
    }
    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.max_requests" });
    }
    if config.metrics.latency_history == 0 {
        errors.push(ValidationError::Zero { field: "metrics.latency_history" });
    }
    if config.outbound.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "outbound.timeout_secs" });
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "security.max_body_size" });
    }

    check_url(&mut errors, "outbound.slow_default_url", &config.outbound.slow_default_url);
    check_url(&mut errors, "outbound.external_default_url", &config.outbound.external_default_url);

    if config.download.max_bytes == 0 {
        errors.push(ValidationError::Zero { field: "download.max_bytes" });
    } else if config.download.default_bytes > config.download.max_bytes {
        errors.push(ValidationError::DownloadDefaultTooLarge {
            default: config.download.default_bytes,
            max: config.download.max_bytes,
        });
    }

    if config.observability.prometheus_enabled {
        check_addr(
            &mut errors,
            "observability.prometheus_address",
            &config.observability.prometheus_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
