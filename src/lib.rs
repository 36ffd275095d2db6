//! Deploy showcase service library.
//!
//! A small HTTP service for exercising deployment platforms: health and
//! metrics endpoints, simulated latency, error injection, file transfer, a
//! WebSocket echo and a dashboard, all behind a rate-limiting, timing request
//! pipeline.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod platform;
pub mod security;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
