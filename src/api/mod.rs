pub mod data;
pub mod health;
pub mod signals;

use crate::error::AppError;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{Json, Router};
use serde::Deserialize;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(signals::router())
        .merge(data::router())
}

/// Extract the JSON body, reporting malformed bodies as 400.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Body of the per-ticker endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TickerRequest {
    #[serde(default)]
    pub ticker: Option<String>,
}

/// Trimmed, non-empty ticker or a 400.
pub(crate) fn require_ticker(ticker: Option<&str>) -> Result<String, AppError> {
    match ticker.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(AppError::BadRequest("ticker is required".to_string())),
    }
}
