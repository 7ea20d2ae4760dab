//! Trading signal pipeline.
//!
//! Price bars flow through the indicator engine, feature preparation and the
//! per-company sequence model; the resulting price predictions are turned into
//! Buy/Hold/Sell decisions, optionally blended with quarterly fundamentals.

pub mod backtest;
pub mod blender;
pub mod features;
pub mod indicators;
pub mod next_day;
pub mod predictor;
pub mod scaler;

pub use blender::{blend, quarter_key, technical_signal, FinancialSignals};
pub use features::{FeatureMatrix, PreparedSeries};
pub use predictor::{PredictionAdapter, PricePrediction};
pub use scaler::{MinMaxScaler, PersistedScaler, ScalingStrategy};

use crate::config::SignalConfig;
use crate::error::SignalError;
use crate::services::artifacts::ArtifactStore;
use crate::sources::PriceSource;
use crate::types::{company_id, BacktestReport, IndicatorRow, NextDayPrediction, PriceBar};
use chrono::{Duration, NaiveDate};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Orchestrates the backtest and next-day requests.
pub struct SignalService {
    source: Arc<dyn PriceSource>,
    artifacts: Arc<ArtifactStore>,
    config: SignalConfig,
    financial_signals_dir: PathBuf,
    output_dir: PathBuf,
}

impl SignalService {
    pub fn new(
        source: Arc<dyn PriceSource>,
        artifacts: Arc<ArtifactStore>,
        config: SignalConfig,
        financial_signals_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            artifacts,
            config,
            financial_signals_dir: financial_signals_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Replay the model over history up to the last completed quarter before `as_of`.
    ///
    /// The Buy/Sell series is also written to the output directory.
    pub async fn backtest(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<BacktestReport, SignalError> {
        let company = company_id(ticker);
        let start = self.config.backtest_start;
        let end = backtest::previous_quarter_end(as_of);
        info!("Backtesting {} from {} to {}", ticker, start, end);

        let bars = self.source.daily_bars(ticker, start, end).await?;
        let rows = self.indicator_rows(&bars)?;
        let artifacts = self.artifacts.get(company).await?;

        let financial_path = self
            .financial_signals_dir
            .join(format!("{}_predictions_signals.csv", company));
        let financial =
            tokio::task::spawn_blocking(move || FinancialSignals::load(&financial_path)).await??;

        let report = backtest::run(
            ticker,
            &rows,
            &artifacts,
            financial.as_ref(),
            &self.config,
        )?;

        let path = backtest::output_path(&self.output_dir, ticker);
        let owned_ticker = ticker.to_string();
        let signals = report.signals.clone();
        tokio::task::spawn_blocking(move || {
            backtest::write_signals(&path, &owned_ticker, &signals)
        })
        .await??;
        Ok(report)
    }

    /// Predict the close following the most recent bar before `as_of`.
    pub async fn next_day(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<NextDayPrediction, SignalError> {
        let company = company_id(ticker);
        let start = as_of - Duration::days(self.config.next_day_lookback_days);
        info!("Next-day prediction for {} from {} to {}", ticker, start, as_of);

        let bars = self.source.daily_bars(ticker, start, as_of).await?;
        let rows = self.indicator_rows(&bars)?;
        let artifacts = self.artifacts.get(company).await?;

        next_day::run(ticker, &rows, &artifacts, &self.config)
    }

    /// Complete indicator rows of `bars`, with enough of them to fill one window.
    fn indicator_rows(&self, bars: &[PriceBar]) -> Result<Vec<IndicatorRow>, SignalError> {
        let rows = indicators::compute_rows(bars);
        if rows.len() < self.config.window {
            return Err(SignalError::InsufficientHistory {
                required: indicators::warm_up_bars() + self.config.window,
                available: bars.len(),
            });
        }
        debug!("{} bars -> {} indicator rows", bars.len(), rows.len());
        Ok(rows)
    }
}
