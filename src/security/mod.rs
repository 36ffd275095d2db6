//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-IP fixed window; 429 when exhausted)
//!     → handler
//! Outgoing response:
//!     → rate_limit.rs (X-RateLimit-* headers)
//!     → headers.rs (fixed security headers)
//! ```

pub mod headers;
pub mod rate_limit;

pub use headers::SecurityHeaders;
pub use rate_limit::{RateDecision, RateLimiter};
