use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Typical price used by volume-weighted indicators.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// A price bar extended with the technical indicators the models were trained on.
///
/// Only rows where every indicator is defined are ever constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Stand-in for the split/dividend adjusted close, which the price source does not provide.
    pub adj_close: f64,
    pub rsi: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub williams_r: f64,
    pub mfi: f64,
    pub ad_line: f64,
    pub obv: f64,
}

/// Feature column names, in the order the models expect. `close` is the target and never a feature.
pub const FEATURE_COLUMNS: [&str; 12] = [
    "Open",
    "High",
    "Low",
    "Volume",
    "Adj Close",
    "RSI",
    "Stochastic_K",
    "Stochastic_D",
    "Williams_%R",
    "MFI",
    "AD_Line",
    "OBV",
];

impl IndicatorRow {
    /// Feature values in `FEATURE_COLUMNS` order.
    pub fn features(&self) -> [f64; 12] {
        [
            self.open,
            self.high,
            self.low,
            self.volume,
            self.adj_close,
            self.rsi,
            self.stoch_k,
            self.stoch_d,
            self.williams_r,
            self.mfi,
            self.ad_line,
            self.obv,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_bar_serialization() {
        let bar = PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 100.0,
        };
        let json = serde_json::to_string(&bar).unwrap();
        assert!(json.contains("\"Date\":\"2024-01-02\""));
        assert!(json.contains("\"Close\":1.5"));
        assert!((bar.typical_price() - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_features_exclude_close() {
        let row = IndicatorRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 1.0,
            high: 2.0,
            low: 3.0,
            close: 99.0,
            volume: 4.0,
            adj_close: 5.0,
            rsi: 6.0,
            stoch_k: 7.0,
            stoch_d: 8.0,
            williams_r: 9.0,
            mfi: 10.0,
            ad_line: 11.0,
            obv: 12.0,
        };
        let features = row.features();
        assert_eq!(features.len(), FEATURE_COLUMNS.len());
        assert!(!features.contains(&99.0));
        assert_eq!(features[4], 5.0);
    }
}
