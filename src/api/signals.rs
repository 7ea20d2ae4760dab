//! Trading signal endpoints.

use super::{body, require_ticker, TickerRequest};
use crate::error::{AppError, Result};
use crate::types::{CompactSignal, NextDayPrediction};
use crate::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use chrono::Utc;
use tracing::{error, info};

/// Create the signals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/backtestingSignals/", post(backtesting_signals))
        .route("/next_day_pred", post(next_day_prediction))
}

/// Buy/Sell signals over the backtest history of a ticker.
async fn backtesting_signals(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TickerRequest>, JsonRejection>,
) -> Result<Json<Vec<CompactSignal>>> {
    let request = body(payload)?;
    let ticker = require_ticker(request.ticker.as_deref())?;
    info!("Backtest requested for {}", ticker);

    let report = state
        .signal_service
        .backtest(&ticker, Utc::now().date_naive())
        .await
        .map_err(|e| {
            error!("Backtest for {} failed: {}", ticker, e);
            AppError::from(e)
        })?;

    if report.signals.is_empty() {
        return Err(AppError::Internal("No signals generated".to_string()));
    }
    Ok(Json(report.signals))
}

/// Signal for the trading day after the most recent close.
async fn next_day_prediction(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TickerRequest>, JsonRejection>,
) -> Result<Json<NextDayPrediction>> {
    let request = body(payload)?;
    let ticker = require_ticker(request.ticker.as_deref())?;
    info!("Next-day prediction requested for {}", ticker);

    let prediction = state
        .signal_service
        .next_day(&ticker, Utc::now().date_naive())
        .await
        .map_err(|e| {
            error!("Next-day prediction for {} failed: {}", ticker, e);
            AppError::from(e)
        })?;

    Ok(Json(prediction))
}
