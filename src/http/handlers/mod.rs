//! Endpoint handlers.
//!
//! Each handler is independent; shared state is limited to what `AppState`
//! carries (metrics, outbound client, config).

pub mod faults;
pub mod files;
pub mod latency;
pub mod status;
