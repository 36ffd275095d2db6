//! Deploy showcase service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ listener ──▶ request ID / CORS / trace
//!                                        │
//!                                        ▼
//!                               ┌─────────────────┐
//!                               │ request pipeline│──▶ 429 (rate limited)
//!                               │ limit + timing  │
//!                               └────────┬────────┘
//!                                        ▼
//!                                    handlers ──▶ outbound HTTP (slow/external)
//!                                        │
//!                                        ▼
//!     Client Response          metrics + security headers
//!     ◀──────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use deploy_showcase::config::{self, LogFormat, ServiceConfig};
use deploy_showcase::http::HttpServer;
use deploy_showcase::lifecycle::{self, Shutdown};
use deploy_showcase::observability;

#[derive(Parser)]
#[command(name = "deploy-showcase")]
#[command(about = "Demo HTTP service for exercising deployment platforms", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "SHOWCASE_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address, overrides the config file and PORT
    #[arg(short, long)]
    bind: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ServiceConfig::default(),
    };
    config::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(format) = cli.log_format {
        config.observability.log_format = format;
    }
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;

    observability::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "deploy-showcase starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_enabled = config.rate_limit.enabled,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window_secs,
        outbound_timeout_secs = config.outbound.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.prometheus_enabled {
        match config.observability.prometheus_address.parse() {
            Ok(addr) => {
                if let Err(e) = observability::metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start Prometheus exporter");
                }
            }
            Err(e) => tracing::error!(
                prometheus_address = %config.observability.prometheus_address,
                error = %e,
                "Failed to parse Prometheus address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { lifecycle::shutdown_on_signal(&shutdown).await });
    }

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
