//! Shared fixtures: an in-memory price source, a constant-output model format
//! and helpers writing artifacts into a temporary models directory.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use ndarray::Array3;
use std::path::Path;
use std::sync::Arc;
use tickcast::config::SignalConfig;
use tickcast::error::SignalError;
use tickcast::services::{ArtifactStore, ModelFormat, SequenceModel, SignalService};
use tickcast::services::signals::ScalingStrategy;
use tickcast::sources::PriceSource;
use tickcast::types::PriceBar;

pub const STUB_FORMAT: &str = "stub";

/// Serves a fixed bar series regardless of the requested range.
pub struct StubSource {
    pub bars: Vec<PriceBar>,
}

#[async_trait]
impl PriceSource for StubSource {
    fn name(&self) -> &str {
        "stub"
    }

    async fn daily_bars(
        &self,
        ticker: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PriceBar>, SignalError> {
        if self.bars.is_empty() {
            return Err(SignalError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: "no bars".to_string(),
            });
        }
        Ok(self.bars.clone())
    }

    async fn history(
        &self,
        ticker: &str,
        _period: &str,
        _interval: &str,
    ) -> Result<Vec<PriceBar>, SignalError> {
        self.daily_bars(ticker, NaiveDate::MIN, NaiveDate::MAX).await
    }
}

/// Emits the same scaled value for every window.
pub struct ConstantModel {
    pub input_size: usize,
    pub output: f64,
}

impl SequenceModel for ConstantModel {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn predict(&self, batch: &Array3<f64>) -> Result<Array3<f64>, SignalError> {
        Ok(Array3::from_elem((batch.dim().0, 1, 1), self.output))
    }
}

/// Model files hold `<input_size> <output>` as plain text.
pub struct StubFormat;

impl ModelFormat for StubFormat {
    fn name(&self) -> &str {
        STUB_FORMAT
    }

    fn extension(&self) -> &str {
        "stub"
    }

    fn load(&self, path: &Path) -> Result<Arc<dyn SequenceModel>, SignalError> {
        let content = std::fs::read_to_string(path).map_err(|e| SignalError::malformed(path, e))?;
        let mut fields = content.split_whitespace();
        let (Some(input_size), Some(output)) = (fields.next(), fields.next()) else {
            return Err(SignalError::malformed(path, "expected `<input_size> <output>`"));
        };
        Ok(Arc::new(ConstantModel {
            input_size: input_size
                .parse()
                .map_err(|e| SignalError::malformed(path, e))?,
            output: output.parse().map_err(|e| SignalError::malformed(path, e))?,
        }))
    }
}

/// Write features, model and residual stats for `company`.
pub fn write_artifacts(
    models_dir: &Path,
    company: &str,
    output: f64,
    std_dev: f64,
    mean_residuals: f64,
) {
    std::fs::create_dir_all(models_dir).unwrap();
    std::fs::write(
        models_dir.join(format!("{}_features.json", company)),
        "[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]",
    )
    .unwrap();
    write_model(models_dir, company, 12, output);
    std::fs::write(
        models_dir.join("predicted.csv"),
        format!(
            "Company,Std_Dev,Mean_Residuals\n{},{},{}\n",
            company, std_dev, mean_residuals
        ),
    )
    .unwrap();
}

/// Replace the stub model of `company`.
pub fn write_model(models_dir: &Path, company: &str, input_size: usize, output: f64) {
    std::fs::write(
        models_dir.join(format!("{}.stub", company)),
        format!("{} {}", input_size, output),
    )
    .unwrap();
}

/// Service over `bars` with artifacts under `root/models` and results under `root/outputs`.
pub fn service(root: &Path, bars: Vec<PriceBar>) -> SignalService {
    let artifacts = ArtifactStore::new(
        root.join("models"),
        Arc::new(StubFormat),
        ScalingStrategy::PerRequest,
    );
    SignalService::new(
        Arc::new(StubSource { bars }),
        Arc::new(artifacts),
        SignalConfig::default(),
        root.join("financial_signals"),
        root.join("outputs"),
    )
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
}

/// Oscillating series on a slow upward drift.
pub fn zigzag_bars(count: usize) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let base = 100.0 + i as f64 * 0.3 + ((i % 7) as f64 - 3.0) * 1.2;
            PriceBar {
                date: start_date() + Duration::days(i as i64),
                open: base - 0.5,
                high: base + 1.5,
                low: base - 1.5,
                close: base,
                volume: 1_000.0 + (i % 5) as f64 * 150.0,
            }
        })
        .collect()
}

/// Strictly rising closes, so the last close is the series maximum.
pub fn uptrend_bars(count: usize) -> Vec<PriceBar> {
    (0..count)
        .map(|i| {
            let base = 100.0 + i as f64 * 1.5;
            PriceBar {
                date: start_date() + Duration::days(i as i64),
                open: base,
                high: base + 2.0,
                low: base - 1.0,
                close: base + 1.0,
                volume: 1_000.0 + (i % 3) as f64 * 100.0,
            }
        })
        .collect()
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
}
