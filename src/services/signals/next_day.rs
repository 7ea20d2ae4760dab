//! Forward prediction for the day after the most recent bar.

use super::blender::technical_signal;
use super::features::{last_window, prepare};
use super::predictor::PredictionAdapter;
use crate::config::SignalConfig;
use crate::error::SignalError;
use crate::services::artifacts::TickerArtifacts;
use crate::types::{IndicatorRow, NextDayPrediction};
use tracing::info;

/// Predict the next close from the trailing window of `rows` and compare it with the last close.
pub fn run(
    ticker: &str,
    rows: &[IndicatorRow],
    artifacts: &TickerArtifacts,
    config: &SignalConfig,
) -> Result<NextDayPrediction, SignalError> {
    let prepared = prepare(rows, &artifacts.features, config.window, artifacts.scaler.as_ref())?;
    let batch = last_window(&prepared.inputs, config.window)?;
    let prediction = PredictionAdapter::new(
        artifacts.model.as_ref(),
        &prepared.target_scaler,
        artifacts.stats,
    )
    .predict(&batch)?
    .into_iter()
    .next()
    .ok_or_else(|| SignalError::InferenceFailure("model returned no prediction".to_string()))?;

    let previous_day_price = prepared
        .closes
        .last()
        .copied()
        .ok_or(SignalError::InsufficientHistory {
            required: config.window,
            available: 0,
        })?;
    let signal = technical_signal(
        prediction.adjusted,
        previous_day_price,
        config.next_day_threshold,
    );

    info!(
        "Next-day prediction for {}: {:.3} (raw {:.3}) vs {:.3} -> {}",
        ticker, prediction.adjusted, prediction.raw, previous_day_price, signal
    );

    Ok(NextDayPrediction {
        predicted_price: prediction.adjusted,
        previous_day_price,
        signal,
        ticker: ticker.to_string(),
    })
}
