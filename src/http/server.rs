//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all endpoint handlers
//! - Wire up middleware (request pipeline, body limit, panic translation,
//!   tracing, request ID, CORS)
//! - Bind server to listener with peer address info
//! - Start the rate-limit bucket sweeper
//! - Graceful shutdown on broadcast signal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::health::StatsCollector;
use crate::http::handlers::{faults, files, latency, status};
use crate::http::pipeline::{handle_panic, request_pipeline};
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::{dashboard, websocket};
use crate::observability::RequestMetrics;
use crate::security::{RateLimiter, SecurityHeaders};

/// Error type for server construction and serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build outbound HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers and the pipeline.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub metrics: Arc<RequestMetrics>,
    pub limiter: Option<Arc<RateLimiter>>,
    pub security_headers: Arc<SecurityHeaders>,
    pub stats: Arc<StatsCollector>,
    pub client: reqwest::Client,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.outbound.timeout_secs))
            .build()?;

        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::from_config(&config.rate_limit)));

        Ok(Self {
            metrics: Arc::new(RequestMetrics::new(config.metrics.latency_history)),
            limiter,
            security_headers: Arc::new(SecurityHeaders::from_config(&config.security)),
            stats: Arc::new(StatsCollector::with_default_providers()),
            client,
            started_at: Instant::now(),
            config: Arc::new(config),
        })
    }
}

/// HTTP server for the showcase service.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        let state = AppState::new(config)?;
        let router = build_router(state.clone());
        Ok(Self { router, state })
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweep_secs = self.state.config.rate_limit.sweep_interval_secs;
        if let (Some(limiter), true) = (self.state.limiter.clone(), sweep_secs > 0) {
            let sweeper_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                limiter
                    .run_sweeper(Duration::from_secs(sweep_secs), sweeper_shutdown)
                    .await;
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the router with every endpoint and the full middleware stack.
pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/platform", get(status::platform))
        .route("/health", get(status::health))
        .route("/metrics", get(status::metrics))
        .route("/fast", get(status::fast))
        .route("/slow", post(latency::slow))
        .route("/external", get(latency::external))
        .route("/error/404", get(faults::error_404))
        .route("/error/500", get(faults::error_500))
        .route("/upload", post(files::upload))
        .route("/download", get(files::download))
        .route("/ws", get(websocket::ws_echo))
        .fallback(faults::not_found)
        .method_not_allowed_fallback(faults::method_not_allowed);

    apply_layers(routes, state)
}

/// Wrap `routes` in the middleware stack. Innermost first.
pub fn apply_layers(routes: Router<AppState>, state: AppState) -> Router {
    let max_body_size = state.config.security.max_body_size;
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(middleware::from_fn_with_state(state.clone(), request_pipeline))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
        .layer(cors)
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}
