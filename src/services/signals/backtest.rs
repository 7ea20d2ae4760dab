//! Historical replay of the model over every window of a ticker's history.

use super::blender::{blend, technical_signal, FinancialSignals};
use super::features::{prepare, sliding_windows};
use super::predictor::PredictionAdapter;
use crate::config::SignalConfig;
use crate::error::SignalError;
use crate::services::artifacts::TickerArtifacts;
use crate::types::{BacktestRecord, BacktestReport, CompactSignal, IndicatorRow};
use chrono::{Datelike, Duration, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Last day of the calendar quarter before the one containing `as_of`.
pub fn previous_quarter_end(as_of: NaiveDate) -> NaiveDate {
    let quarter_start_month = (as_of.month() - 1) / 3 * 3 + 1;
    NaiveDate::from_ymd_opt(as_of.year(), quarter_start_month, 1)
        .map(|start| start - Duration::days(1))
        .unwrap_or(as_of)
}

/// `{output_dir}/technical_{ticker}_predictions.csv`
pub fn output_path(output_dir: &Path, ticker: &str) -> PathBuf {
    output_dir.join(format!("technical_{}_predictions.csv", ticker))
}

/// Predict every window of `rows` and derive technical, financial and final signals.
///
/// Window `w` covers rows `[w, w + window)` and is labelled with its last row.
/// The first label has no prior close, so it carries no technical or final signal.
pub fn run(
    ticker: &str,
    rows: &[IndicatorRow],
    artifacts: &TickerArtifacts,
    financial: Option<&FinancialSignals>,
    config: &SignalConfig,
) -> Result<BacktestReport, SignalError> {
    let window = config.window;
    let prepared = prepare(rows, &artifacts.features, window, artifacts.scaler.as_ref())?;
    let batch = sliding_windows(&prepared.inputs, window)?;
    let predictions = PredictionAdapter::new(
        artifacts.model.as_ref(),
        &prepared.target_scaler,
        artifacts.stats,
    )
    .predict(&batch)?;

    let mut records = Vec::with_capacity(predictions.len());
    let mut signals = Vec::new();

    for (w, prediction) in predictions.iter().enumerate() {
        let label = w + window - 1;
        let date = prepared.dates[label];
        let prev_actual_close = (w > 0).then(|| prepared.closes[label - 1]);

        let technical = prev_actual_close
            .map(|prior| technical_signal(prediction.adjusted, prior, config.backtest_threshold));
        let fundamental = financial.and_then(|table| table.for_date(date));
        let final_signal = technical.map(|signal| blend(signal, fundamental, &config.blend));

        if let Some(signal) = final_signal.filter(|s| s.is_actionable()) {
            signals.push(CompactSignal {
                date,
                ticker: ticker.to_string(),
                signal,
            });
        }

        records.push(BacktestRecord {
            date,
            actual_close: prepared.closes[label],
            predicted_close: prediction.raw,
            prev_actual_close,
            adjusted_predicted_close: prediction.adjusted,
            technical_signal: technical,
            financial_signal: fundamental,
            final_signal,
        });
    }

    info!(
        "Backtest for {}: {} labels, {} actionable signals",
        ticker,
        records.len(),
        signals.len()
    );
    for record in &records {
        debug!(
            "{} actual={:.3} predicted={:.3} adjusted={:.3} prev={:?} technical={:?} financial={:?} final={:?}",
            record.date,
            record.actual_close,
            record.predicted_close,
            record.adjusted_predicted_close,
            record.prev_actual_close,
            record.technical_signal,
            record.financial_signal,
            record.final_signal
        );
    }

    Ok(BacktestReport {
        ticker: ticker.to_string(),
        records,
        signals,
    })
}

/// Write the compact signal series as `Date,<ticker>`, replacing any previous file.
pub fn write_signals(path: &Path, ticker: &str, signals: &[CompactSignal]) -> Result<(), SignalError> {
    let persist = |e: &dyn std::fmt::Display| {
        SignalError::Persist(format!("{}: {}", path.display(), e))
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| persist(&e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| persist(&e))?;
    writer.write_record(["Date", ticker]).map_err(|e| persist(&e))?;
    for entry in signals {
        writer
            .write_record([
                entry.date.format("%Y-%m-%d").to_string(),
                entry.signal.value().to_string(),
            ])
            .map_err(|e| persist(&e))?;
    }
    writer.flush().map_err(|e| persist(&e))?;

    debug!("Wrote {} signals to {}", signals.len(), path.display());
    Ok(())
}
