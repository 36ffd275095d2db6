//! Latency simulation: timed sleeps and outbound HTTP calls.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use rand::Rng;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Default sleep range when the caller gives no `sleep_sec`.
const RANDOM_SLEEP_SECS: std::ops::Range<f64> = 1.0..2.0;

/// Fields are loosely typed: `mode` and `url` accept any JSON value and are
/// compared as text, `sleep_sec` accepts numbers, numeric strings and booleans.
#[derive(Debug, Default, Deserialize)]
pub struct SlowRequest {
    pub mode: Option<Value>,
    pub sleep_sec: Option<Value>,
    pub url: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SlowResponse {
    Sleep {
        mode: &'static str,
        sleep_sec: f64,
        elapsed_sec: f64,
    },
    Http {
        mode: &'static str,
        url: String,
        elapsed_sec: f64,
        data: Value,
    },
}

#[derive(Debug, Deserialize)]
pub struct ExternalQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExternalResponse {
    pub status_code: u16,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub json: Value,
}

/// `POST /slow`. The body is optional; an empty body means a random sleep.
pub async fn slow(State(state): State<AppState>, body: Bytes) -> Result<Json<SlowResponse>, ApiError> {
    let request: SlowRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SlowRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| ApiError::BadRequest("invalid_json"))?
    };

    let started = Instant::now();

    if request.mode.as_ref().map(as_text).as_deref() == Some("http") {
        let url = request
            .url
            .as_ref()
            .map(as_text)
            .unwrap_or_else(|| state.config.outbound.slow_default_url.clone());
        tracing::debug!(url = %url, "Slow request via outbound HTTP");

        let data: Value = state.client.get(&url).send().await?.json().await?;
        return Ok(Json(SlowResponse::Http {
            mode: "http",
            url,
            elapsed_sec: round3(started.elapsed().as_secs_f64()),
            data,
        }));
    }

    let sleep_for = match request.sleep_sec.as_ref() {
        Some(value) => as_seconds(value).ok_or(ApiError::BadRequest("invalid_sleep_sec"))?,
        None => rand::thread_rng().gen_range(RANDOM_SLEEP_SECS),
    };
    let duration = Duration::try_from_secs_f64(sleep_for.max(0.0))
        .map_err(|e| ApiError::Internal(format!("invalid sleep duration {}: {}", sleep_for, e)))?;

    tokio::time::sleep(duration).await;

    Ok(Json(SlowResponse::Sleep {
        mode: "sleep",
        sleep_sec: round3(sleep_for),
        elapsed_sec: round3(started.elapsed().as_secs_f64()),
    }))
}

/// `GET /external?url=`. Proxies a GET and reports what came back.
pub async fn external(
    State(state): State<AppState>,
    query: Result<Query<ExternalQuery>, QueryRejection>,
) -> Result<Json<ExternalResponse>, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::BadRequest("invalid_query"))?;
    let url = query
        .url
        .unwrap_or_else(|| state.config.outbound.external_default_url.clone());

    let response = state.client.get(&url).send().await?;
    let status_code = response.status().as_u16();
    let headers = flatten_headers(response.headers());
    let json = response.json().await?;

    Ok(Json(ExternalResponse {
        status_code,
        url,
        headers,
        json,
    }))
}

/// Header map as name → value, repeated headers joined with `", "`.
fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    flat
}

/// Strings as-is, anything else in its JSON form.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
