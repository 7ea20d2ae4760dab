//! Turning predicted-vs-actual deviations into discrete decisions.

use crate::config::BlendWeights;
use crate::error::SignalError;
use crate::types::Signal;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Compare a predicted close with a reference close.
///
/// Moves of at most `threshold` (relative to `prior`) are a Hold.
pub fn technical_signal(predicted: f64, prior: f64, threshold: f64) -> Signal {
    if (predicted - prior).abs() <= threshold * prior {
        Signal::Hold
    } else if predicted > prior {
        Signal::Buy
    } else {
        Signal::Sell
    }
}

/// Weighted vote of the technical and financial signals.
pub fn blend(technical: Signal, financial: Option<Signal>, weights: &BlendWeights) -> Signal {
    let Some(financial) = financial else {
        return technical;
    };

    let weighted = weights.technical * f64::from(technical.value())
        + weights.financial * f64::from(financial.value());
    if weighted > weights.cutoff {
        Signal::Buy
    } else if weighted < -weights.cutoff {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Calendar quarter key, e.g. `2023Q2`.
pub fn quarter_key(date: NaiveDate) -> String {
    format!("{}Q{}", date.year(), (date.month() - 1) / 3 + 1)
}

#[derive(Debug, Deserialize)]
struct QuarterRow {
    #[serde(rename = "Quarter")]
    quarter: String,
    #[serde(rename = "Signal")]
    signal: f64,
}

/// Quarterly fundamentals-derived signals of one company.
#[derive(Debug, Clone, Default)]
pub struct FinancialSignals {
    by_quarter: HashMap<String, Signal>,
}

impl FinancialSignals {
    /// Read a `Quarter,Signal` table. A missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>, SignalError> {
        if !path.exists() {
            warn!("Financial signals file not found: {}", path.display());
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(path).map_err(|e| SignalError::malformed(path, e))?;
        let mut by_quarter = HashMap::new();
        for row in reader.deserialize::<QuarterRow>() {
            let row = row.map_err(|e| SignalError::malformed(path, e))?;
            // Signals are written as floats by the batch job (1.0, -1.0, 0.0)
            let signal = Signal::try_from(row.signal.round() as i8)
                .map_err(|e| SignalError::malformed(path, e))?;
            by_quarter.insert(row.quarter.trim().to_string(), signal);
        }

        debug!(
            "Loaded {} quarterly financial signals from {}",
            by_quarter.len(),
            path.display()
        );
        Ok(Some(Self { by_quarter }))
    }

    pub fn from_pairs<I: IntoIterator<Item = (String, Signal)>>(pairs: I) -> Self {
        Self {
            by_quarter: pairs.into_iter().collect(),
        }
    }

    pub fn for_date(&self, date: NaiveDate) -> Option<Signal> {
        self.by_quarter.get(&quarter_key(date)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_quarter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_quarter.is_empty()
    }
}
