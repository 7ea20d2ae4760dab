//! HTTP endpoint tests driven through the router without a listening socket.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::*;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tickcast::config::Config;
use tickcast::types::PriceBar;
use tickcast::AppState;
use tower::ServiceExt;

fn app(root: &Path, bars: Vec<PriceBar>) -> Router {
    let state = AppState {
        config: Arc::new(Config::from_env()),
        signal_service: Arc::new(service(root, bars.clone())),
        source: Arc::new(StubSource { bars }),
    };
    tickcast::app(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_root_status() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(app(dir.path(), Vec::new()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Stock Predictor is running");
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(dir.path(), Vec::new()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_next_day_prediction() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(&dir.path().join("models"), "XYZ", 1.0, 0.0, 0.0);
    let bars = uptrend_bars(100);
    let last_close = bars.last().unwrap().close;

    let (status, body) = send(
        app(dir.path(), bars),
        post("/next_day_pred", r#"{"ticker": "XYZ"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["signal"], 0);
    assert_eq!(body["ticker"], "XYZ");
    assert_eq!(body["previous_day_price"], last_close);
    assert!(body["predicted_price"].is_number());
}

#[tokio::test]
async fn test_backtesting_signals() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(&dir.path().join("models"), "XYZ", 0.5, 0.0, 0.0);

    let (status, body) = send(
        app(dir.path(), zigzag_bars(300)),
        post("/backtestingSignals/", r#"{"ticker": "XYZ"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert!(!entries.is_empty());
    for entry in entries {
        assert!(entry["Date"].is_string());
        assert!(entry["XYZ"] == 1 || entry["XYZ"] == -1);
    }
}

#[tokio::test]
async fn test_backtest_without_actionable_signals() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(&dir.path().join("models"), "XYZ", 0.5, 0.0, 0.0);

    // 26 bars leave exactly one window, whose label has no prior close
    let (status, body) = send(
        app(dir.path(), zigzag_bars(26)),
        post("/backtestingSignals/", r#"{"ticker": "XYZ"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("No signals generated"));
}

#[tokio::test]
async fn test_missing_model_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(
        app(dir.path(), uptrend_bars(60)),
        post("/next_day_pred", r#"{"ticker": "NOPE"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("NOPE"));
}

#[tokio::test]
async fn test_missing_ticker_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    for (uri, payload) in [
        ("/next_day_pred", "{}"),
        ("/backtestingSignals/", r#"{"ticker": "  "}"#),
        ("/fetch-data", r#"{"period": "5d"}"#),
        ("/next_day_pred", "not json"),
    ] {
        let (status, _) = send(app(dir.path(), Vec::new()), post(uri, payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", uri, payload);
    }
}

#[tokio::test]
async fn test_fetch_data() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(
        app(dir.path(), uptrend_bars(5)),
        post("/fetch-data", r#"{"ticker": "AAPL"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["ticker"], "AAPL");
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert!(body["data"][0]["Close"].is_number());
}

#[tokio::test]
async fn test_fetch_data_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(
        app(dir.path(), Vec::new()),
        post("/fetch-data", r#"{"ticker": "ZZZZ"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}
