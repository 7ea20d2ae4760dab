//! Raw price history passthrough.

use super::{body, require_ticker};
use crate::error::{AppError, Result, SignalError};
use crate::types::PriceBar;
use crate::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

fn default_period() -> String {
    "1y".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

#[derive(Debug, Deserialize)]
pub struct FetchDataRequest {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_interval")]
    pub interval: String,
}

#[derive(Debug, Serialize)]
pub struct FetchDataResponse {
    pub status: &'static str,
    pub ticker: String,
    pub data: Vec<PriceBar>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/fetch-data", post(fetch_data))
}

async fn fetch_data(
    State(state): State<AppState>,
    payload: std::result::Result<Json<FetchDataRequest>, JsonRejection>,
) -> Result<Json<FetchDataResponse>> {
    let request = body(payload)?;
    let ticker = require_ticker(request.ticker.as_deref())?;
    info!(
        "Fetching {} history for {} at {}",
        request.period, ticker, request.interval
    );

    let data = state
        .source
        .history(&ticker, &request.period, &request.interval)
        .await
        .map_err(|e| match e {
            SignalError::DataUnavailable { .. } => {
                AppError::NotFound(format!("No data found for ticker {}", ticker))
            }
            other => AppError::from(other),
        })?;

    Ok(Json(FetchDataResponse {
        status: "success",
        ticker,
        data,
    }))
}
