//! Relative Strength Index (RSI) indicator.

use crate::types::PriceBar;

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses.
/// Gains and losses are smoothed with Wilder's exponential average
/// (`alpha = 1 / period`) seeded at the first bar, whose change counts as zero.
/// Values range from 0-100.
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Bars needed before the first defined value.
    pub fn min_periods(&self) -> usize {
        self.period
    }

    fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            return 100.0;
        }
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }

    /// RSI for every bar; the first `period - 1` bars are undefined.
    pub fn calculate(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let mut out = vec![None; bars.len()];
        if self.period == 0 || bars.len() < self.min_periods() {
            return out;
        }

        let alpha = 1.0 / self.period as f64;
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        let mut prev_close = bars[0].close;

        for (i, bar) in bars.iter().enumerate() {
            let change = bar.close - prev_close;
            prev_close = bar.close;
            avg_gain += (change.max(0.0) - avg_gain) * alpha;
            avg_loss += ((-change).max(0.0) - avg_loss) * alpha;

            if i + 1 >= self.period {
                out[i] = Some(Self::rsi_value(avg_gain, avg_loss));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::{synthetic_bars, uptrend_bars};

    #[test]
    fn test_rsi_min_periods() {
        assert_eq!(Rsi::default().min_periods(), 14);
        assert_eq!(Rsi::new(7).min_periods(), 7);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let values = Rsi::default().calculate(&uptrend_bars(13));
        assert_eq!(values.len(), 13);
        assert!(values.iter().all(Option::is_none));
    }

    #[test]
    fn test_rsi_alignment() {
        let values = Rsi::default().calculate(&synthetic_bars(40));
        assert!(values[..13].iter().all(Option::is_none));
        assert!(values[13..].iter().all(Option::is_some));
    }

    #[test]
    fn test_rsi_uptrend_is_100() {
        let values = Rsi::default().calculate(&uptrend_bars(30));
        assert_eq!(values[29], Some(100.0));
    }

    #[test]
    fn test_rsi_value_range() {
        let values = Rsi::default().calculate(&synthetic_bars(80));
        for v in values.into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI out of range: {}", v);
        }
    }

    #[test]
    fn test_rsi_matches_wilder_ewm_reference() {
        // reference values of the 14-bar exponential RSI seeded at bar 0
        let values = Rsi::default().calculate(&synthetic_bars(80));
        for (i, expected) in [
            (13, 73.10809679420944),
            (15, 53.72897501265526),
            (30, 55.34676317059314),
        ] {
            let rsi = values[i].unwrap();
            assert!((rsi - expected).abs() < 1e-9, "idx {}: {} vs {}", i, rsi, expected);
        }
    }

    #[test]
    fn test_rsi_first_bar_counts_as_zero_change() {
        // flat closes then one jump: only gains, then only losses
        let mut bars = uptrend_bars(14);
        for bar in bars.iter_mut() {
            bar.close = 100.0;
        }
        bars[13].close = 114.0;
        assert_eq!(Rsi::default().calculate(&bars)[13], Some(100.0));
        bars[13].close = 86.0;
        assert_eq!(Rsi::default().calculate(&bars)[13], Some(0.0));
    }
}
