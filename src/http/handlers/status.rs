//! Status endpoints: health, platform, metrics, and the fast baseline.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::health::{uptime_secs, HealthReport};
use crate::http::server::AppState;
use crate::observability::MetricsSnapshot;
use crate::platform::{self, PlatformInfo};

/// Body of `GET /metrics`.
#[derive(Debug, Serialize)]
pub struct MetricsReport {
    #[serde(flatten)]
    pub snapshot: MetricsSnapshot,
    pub uptime_sec: f64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport::new(
        state.started_at,
        platform::detect(),
        state.stats.collect(),
    ))
}

pub async fn platform() -> Json<PlatformInfo> {
    Json(platform::detect())
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(MetricsReport {
        snapshot: state.metrics.snapshot(),
        uptime_sec: uptime_secs(state.started_at),
    })
}

pub async fn fast() -> Json<Value> {
    Json(json!({ "message": "fast response" }))
}
