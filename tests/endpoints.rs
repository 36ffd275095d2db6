//! End-to-end tests against a running service on an ephemeral port.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_health_reports_ok() {
    let server = common::spawn_server(common::test_config()).await;

    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["runtime_version"], env!("SHOWCASE_RUSTC_VERSION"));
    assert_ne!(body["runtime_version"], env!("CARGO_PKG_RUST_VERSION"));
    assert!(body["uptime_sec"].as_f64().unwrap() >= 0.0);
    assert!(body["platform"]["name"].is_string());
    assert!(body["stats"].is_object());
}

#[tokio::test]
async fn test_fast_and_platform() {
    let server = common::spawn_server(common::test_config()).await;

    let body: Value = reqwest::get(server.url("/fast")).await.unwrap().json().await.unwrap();
    assert_eq!(body, json!({ "message": "fast response" }));

    let body: Value = reqwest::get(server.url("/platform")).await.unwrap().json().await.unwrap();
    assert!(body["name"].is_string());
    assert!(body["evidence"].is_string());
}

#[tokio::test]
async fn test_metrics_count_prior_requests() {
    let server = common::spawn_server(common::test_config()).await;

    for _ in 0..3 {
        reqwest::get(server.url("/fast")).await.unwrap();
    }

    let body: Value = reqwest::get(server.url("/metrics")).await.unwrap().json().await.unwrap();
    assert_eq!(body["requests_total"], 3);
    assert_eq!(body["requests_by_path"]["/fast"], 3);
    assert_eq!(body["latency_ms"]["count"], 3);
    assert!(body["latency_ms"]["max"].as_f64().unwrap() >= 0.0);
    assert!(body["uptime_sec"].is_number());
}

#[tokio::test]
async fn test_pipeline_headers_present() {
    let server = common::spawn_server(common::test_config()).await;

    let res = reqwest::get(server.url("/fast")).await.unwrap();
    let headers = res.headers();
    assert_eq!(headers["x-ratelimit-limit"], "60");
    assert_eq!(headers["x-ratelimit-remaining"], "59");
    assert_eq!(headers["x-ratelimit-reset"], "60");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("x-response-time-ms"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_rate_limit_disabled_omits_headers() {
    let mut config = common::test_config();
    config.rate_limit.enabled = false;
    let server = common::spawn_server(config).await;

    let res = reqwest::get(server.url("/fast")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(!res.headers().contains_key("x-ratelimit-limit"));
    assert!(res.headers().contains_key("x-response-time-ms"));
}

#[tokio::test]
async fn test_rate_limit_blocks_over_limit() {
    let mut config = common::test_config();
    config.rate_limit.max_requests = 2;
    let server = common::spawn_server(config).await;

    for _ in 0..2 {
        let res = reqwest::get(server.url("/fast")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = reqwest::get(server.url("/fast")).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()["x-ratelimit-remaining"], "0");
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "rate_limited" }));
}

#[tokio::test]
async fn test_simulated_errors() {
    let server = common::spawn_server(common::test_config()).await;

    let res = reqwest::get(server.url("/error/404")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "not_found" }));

    let res = reqwest::get(server.url("/error/500")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "internal_error" }));

    let body: Value = reqwest::get(server.url("/metrics")).await.unwrap().json().await.unwrap();
    assert_eq!(body["requests_by_path"]["/error/404"], 1);
    assert_eq!(body["requests_by_path"]["/error/500"], 1);
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method() {
    let server = common::spawn_server(common::test_config()).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().contains_key("x-response-time-ms"));
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "not_found" }));

    let res = client.get(server.url("/slow")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({ "error": "method_not_allowed" })
    );
}

#[tokio::test]
async fn test_slow_sleep_mode() {
    let server = common::spawn_server(common::test_config()).await;

    let res = reqwest::Client::new()
        .post(server.url("/slow"))
        .json(&json!({ "mode": "sleep", "sleep_sec": 0.05 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["mode"], "sleep");
    assert_eq!(body["sleep_sec"], 0.05);
    let elapsed = body["elapsed_sec"].as_f64().unwrap();
    assert!((0.05..0.5).contains(&elapsed), "elapsed {}", elapsed);
}

#[tokio::test]
async fn test_slow_coerces_loose_fields() {
    let server = common::spawn_server(common::test_config()).await;

    let res = reqwest::Client::new()
        .post(server.url("/slow"))
        .json(&json!({ "mode": 5, "sleep_sec": "0.05" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["mode"], "sleep");
    assert_eq!(body["sleep_sec"], 0.05);

    let res = reqwest::Client::new()
        .post(server.url("/slow"))
        .json(&json!({ "sleep_sec": "soon" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "invalid_sleep_sec" }));
}

#[tokio::test]
async fn test_slow_negative_sleep_returns_immediately() {
    let server = common::spawn_server(common::test_config()).await;

    let body: Value = reqwest::Client::new()
        .post(server.url("/slow"))
        .json(&json!({ "sleep_sec": -1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["mode"], "sleep");
    assert!(body["elapsed_sec"].as_f64().unwrap() < 0.5);
}

#[tokio::test]
async fn test_slow_rejects_malformed_json() {
    let server = common::spawn_server(common::test_config()).await;

    let res = reqwest::Client::new()
        .post(server.url("/slow"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "invalid_json" }));
}

#[tokio::test]
async fn test_slow_http_mode_uses_upstream() {
    let upstream = common::start_mock_backend(r#"{"hello":"world"}"#).await;
    let server = common::spawn_server(common::test_config()).await;
    let url = format!("http://{}/delay", upstream);

    let body: Value = reqwest::Client::new()
        .post(server.url("/slow"))
        .json(&json!({ "mode": "http", "url": url }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["mode"], "http");
    assert_eq!(body["url"], url.as_str());
    assert_eq!(body["data"], json!({ "hello": "world" }));
}

#[tokio::test]
async fn test_external_proxies_upstream() {
    let upstream = common::start_mock_backend(r#"{"ok":true}"#).await;
    let server = common::spawn_server(common::test_config()).await;
    let url = format!("http://{}/get", upstream);

    let res = reqwest::Client::new()
        .get(server.url("/external"))
        .query(&[("url", url.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status_code"], 200);
    assert_eq!(body["url"], url.as_str());
    assert_eq!(body["headers"]["x-mock"], "yes");
    assert_eq!(body["json"], json!({ "ok": true }));
}

#[tokio::test]
async fn test_external_bad_query_is_json() {
    let server = common::spawn_server(common::test_config()).await;

    let res = reqwest::get(server.url("/external?url=http://a/&url=http://b/"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "invalid_query" }));
}

#[tokio::test]
async fn test_external_upstream_timeout_is_internal_error() {
    let upstream = common::start_hanging_backend().await;
    let mut config = common::test_config();
    config.outbound.timeout_secs = 1;
    let server = common::spawn_server(config).await;

    let res = reqwest::Client::new()
        .get(server.url("/external"))
        .query(&[("url", format!("http://{}/", upstream))])
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "internal_error" }));
}

#[tokio::test]
async fn test_download_default_and_clamped() {
    let server = common::spawn_server(common::test_config()).await;

    let res = reqwest::get(server.url("/download")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/octet-stream");
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=sample_1024.bin"
    );
    let bytes = res.bytes().await.unwrap();
    assert_eq!(bytes.len(), 1024);
    assert_eq!(&bytes[..16], b"0123456789abcdef");

    let res = reqwest::get(server.url("/download?size=5000000")).await.unwrap();
    assert_eq!(res.bytes().await.unwrap().len(), 1_048_576);

    let res = reqwest::get(server.url("/download?size=0")).await.unwrap();
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=sample_1.bin"
    );
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"0");
}

#[tokio::test]
async fn test_download_beyond_64_bits_is_clamped() {
    let server = common::spawn_server(common::test_config()).await;

    let res = reqwest::get(server.url("/download?size=99999999999999999999"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=sample_1048576.bin"
    );
    assert_eq!(res.bytes().await.unwrap().len(), 1_048_576);

    let res = reqwest::get(server.url("/download?size=-99999999999999999999"))
        .await
        .unwrap();
    assert_eq!(res.bytes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_download_non_integer_size_is_json_error() {
    let server = common::spawn_server(common::test_config()).await;

    let res = reqwest::get(server.url("/download?size=abc")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert!(res.headers().contains_key("x-response-time-ms"));
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "invalid_query" }));
}

#[tokio::test]
async fn test_upload_of_several_megabytes() {
    let server = common::spawn_server(common::test_config()).await;

    let part = reqwest::multipart::Part::bytes(vec![1u8; 3 * 1024 * 1024])
        .file_name("big.bin")
        .mime_str("application/octet-stream")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);

    let res = reqwest::Client::new()
        .post(server.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["size_bytes"], 3 * 1024 * 1024);
}

#[tokio::test]
async fn test_upload_reports_size() {
    let server = common::spawn_server(common::test_config()).await;

    let part = reqwest::multipart::Part::bytes(vec![7u8; 4096])
        .file_name("blob.bin")
        .mime_str("application/octet-stream")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);

    let res = reqwest::Client::new()
        .post(server.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({
            "filename": "blob.bin",
            "content_type": "application/octet-stream",
            "size_bytes": 4096
        })
    );
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let server = common::spawn_server(common::test_config()).await;

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let res = reqwest::Client::new()
        .post(server.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "error": "missing_file" }));
}

#[tokio::test]
async fn test_dashboard_served() {
    let server = common::spawn_server(common::test_config()).await;

    let res = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let html = res.text().await.unwrap();
    assert!(html.contains("Deploy Showcase"));
    assert!(!html.contains("__PLATFORM_NAME__"));
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let server = common::spawn_server(common::test_config()).await;
    let addr = server.addr;

    assert!(reqwest::get(server.url("/fast")).await.is_ok());
    drop(server);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
        .unwrap();
    assert!(client.get(format!("http://{}/fast", addr)).send().await.is_err());
}
