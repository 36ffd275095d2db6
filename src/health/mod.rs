//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → platform.rs (environment → PlatformInfo)
//!     → stats.rs (provider chain → SystemStats)
//!     → HealthReport (serialized by the handler)
//! ```

pub mod stats;

use std::time::Instant;

use serde::Serialize;

use crate::platform::PlatformInfo;

pub use stats::{StatsCollector, StatsProvider, SystemStats};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Version of the compiler that built this binary.
pub const RUNTIME_VERSION: &str = env!("SHOWCASE_RUSTC_VERSION");

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub uptime_sec: f64,
    pub platform: PlatformInfo,
    pub stats: SystemStats,
    pub version: &'static str,
    pub runtime_version: &'static str,
}

impl HealthReport {
    pub fn new(started_at: Instant, platform: PlatformInfo, stats: SystemStats) -> Self {
        Self {
            status: "ok",
            uptime_sec: uptime_secs(started_at),
            platform,
            stats,
            version: VERSION,
            runtime_version: RUNTIME_VERSION,
        }
    }
}

/// Seconds since `started_at`, rounded to 2 decimals.
pub fn uptime_secs(started_at: Instant) -> f64 {
    (started_at.elapsed().as_secs_f64() * 100.0).round() / 100.0
}
