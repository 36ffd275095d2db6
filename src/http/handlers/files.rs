//! File transfer endpoints.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures_util::stream;
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::server::AppState;

const PATTERN: &[u8; 16] = b"0123456789abcdef";

/// Streamed chunk size; a multiple of the pattern length so every chunk
/// starts at the beginning of the pattern.
const CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: u64,
}

/// `size` is kept as text so integers beyond `i64` still clamp.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub size: Option<String>,
}

/// `POST /upload`: measure the `file` part without keeping it.
pub async fn upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadReport>, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::BadRequest("invalid_multipart"))?;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("invalid_multipart"))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let mut size_bytes = 0u64;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::BadRequest("invalid_multipart"))?
        {
            size_bytes += chunk.len() as u64;
        }

        tracing::debug!(filename = ?filename, size_bytes, "Upload received");
        return Ok(Json(UploadReport {
            filename,
            content_type,
            size_bytes,
        }));
    }

    Err(ApiError::Unprocessable("missing_file"))
}

/// `GET /download?size=`: stream a generated attachment.
pub async fn download(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::BadRequest("invalid_query"))?;
    let max = state.config.download.max_bytes;
    let requested = match query.size.as_deref() {
        Some(raw) => parse_size(raw).ok_or(ApiError::BadRequest("invalid_query"))?,
        None => i64::try_from(state.config.download.default_bytes).unwrap_or(i64::MAX),
    };
    let size = clamp_size(requested, max);

    let disposition = format!("attachment; filename=sample_{}.bin", size);
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(pattern_stream(size as usize)),
    )
        .into_response())
}

/// Parse an integer size, saturating values outside the `i64` range.
fn parse_size(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

fn clamp_size(requested: i64, max: u64) -> u64 {
    requested.clamp(1, i64::try_from(max).unwrap_or(i64::MAX)) as u64
}

fn pattern_stream(size: usize) -> impl futures_util::Stream<Item = Result<Bytes, Infallible>> {
    let template = Bytes::from(PATTERN.repeat(CHUNK_SIZE / PATTERN.len()));
    stream::iter(
        (0..size)
            .step_by(CHUNK_SIZE)
            .map(move |offset| Ok(template.slice(..CHUNK_SIZE.min(size - offset)))),
    )
}
