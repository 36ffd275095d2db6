//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers, connect info)
//!     → request.rs (request ID)
//!     → pipeline.rs (rate limit, timing, metrics, response headers)
//!     → handlers/ | websocket.rs | dashboard.rs
//!     → error.rs (ApiError → JSON error body)
//!     → Send to client
//! ```

pub mod dashboard;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod request;
pub mod server;
pub mod websocket;

pub use error::ApiError;
pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
