//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline produces:
//!     → logging.rs (one structured line per request, tracing spans)
//!     → metrics.rs (in-process counters + latency history, metrics facade)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → GET /metrics (JSON snapshot)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{LatencyStats, MetricsSnapshot, RequestMetrics};
