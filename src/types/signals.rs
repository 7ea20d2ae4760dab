use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Discrete trade decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Signal {
    Sell,
    Hold,
    Buy,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Sell => -1,
            Signal::Hold => 0,
            Signal::Buy => 1,
        }
    }

    /// Whether this signal asks for a position change.
    pub fn is_actionable(self) -> bool {
        self != Signal::Hold
    }
}

impl From<Signal> for i8 {
    fn from(signal: Signal) -> Self {
        signal.value()
    }
}

impl TryFrom<i8> for Signal {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Sell),
            0 => Ok(Signal::Hold),
            1 => Ok(Signal::Buy),
            other => Err(format!("invalid signal value {}", other)),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Signal::Sell => "sell",
            Signal::Hold => "hold",
            Signal::Buy => "buy",
        };
        f.write_str(label)
    }
}

/// Training-time residual statistics for one company.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualStats {
    pub std_dev: f64,
    pub mean_residuals: f64,
}

impl ResidualStats {
    /// Shift a raw prediction by one standard deviation in the direction of the mean residual.
    pub fn correct(&self, predicted: f64) -> f64 {
        if self.mean_residuals > 0.0 {
            predicted + self.std_dev
        } else {
            predicted - self.std_dev
        }
    }
}

fn round3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64((value * 1000.0).round() / 1000.0)
    } else {
        serializer.serialize_none()
    }
}

fn round3_opt<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => round3(v, serializer),
        None => serializer.serialize_none(),
    }
}

/// Every intermediate value computed for one backtest label date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Actual_Close", serialize_with = "round3")]
    pub actual_close: f64,
    #[serde(rename = "Predicted_Close", serialize_with = "round3")]
    pub predicted_close: f64,
    #[serde(rename = "prev_actual_close", serialize_with = "round3_opt")]
    pub prev_actual_close: Option<f64>,
    #[serde(rename = "Adjusted_Predicted_Close", serialize_with = "round3")]
    pub adjusted_predicted_close: f64,
    #[serde(rename = "Technical_Signal")]
    pub technical_signal: Option<Signal>,
    #[serde(rename = "Financial_Signal")]
    pub financial_signal: Option<Signal>,
    #[serde(rename = "Final_Signal")]
    pub final_signal: Option<Signal>,
}

/// Compact `{Date, <ticker>: signal}` entry for label dates with a Buy or Sell decision.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactSignal {
    pub date: NaiveDate,
    pub ticker: String,
    pub signal: Signal,
}

impl Serialize for CompactSignal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("Date", &self.date.format("%Y-%m-%d").to_string())?;
        map.serialize_entry(&self.ticker, &self.signal)?;
        map.end()
    }
}

/// Output of one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub ticker: String,
    pub records: Vec<BacktestRecord>,
    pub signals: Vec<CompactSignal>,
}

/// Forward-looking signal for the day after the most recent bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextDayPrediction {
    /// Bias-corrected predicted close.
    pub predicted_price: f64,
    pub previous_day_price: f64,
    pub signal: Signal,
    pub ticker: String,
}
