//! Williams %R indicator.

use super::stochastic::price_range;
use crate::types::PriceBar;

/// Williams %R.
///
/// %R = (Highest High - Close) / (Highest High - Lowest Low) * -100
///
/// Ranges from -100 (close at the period low) to 0 (close at the period high),
/// undefined when the period has no range.
pub struct WilliamsR {
    lookback: usize,
}

impl Default for WilliamsR {
    fn default() -> Self {
        Self { lookback: 14 }
    }
}

impl WilliamsR {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    pub fn min_periods(&self) -> usize {
        self.lookback
    }

    pub fn calculate(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let mut out = vec![None; bars.len()];
        if self.lookback == 0 || bars.len() < self.lookback {
            return out;
        }

        for i in (self.lookback - 1)..bars.len() {
            let (lowest_low, highest_high) = price_range(&bars[(i + 1 - self.lookback)..=i]);
            out[i] = (highest_high != lowest_low)
                .then(|| -100.0 * (highest_high - bars[i].close) / (highest_high - lowest_low));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::{synthetic_bars, uptrend_bars};

    #[test]
    fn test_williams_alignment() {
        let values = WilliamsR::default().calculate(&synthetic_bars(20));
        assert!(values[..13].iter().all(Option::is_none));
        assert!(values[13..].iter().all(Option::is_some));
    }

    #[test]
    fn test_williams_uptrend_near_zero() {
        let values = WilliamsR::default().calculate(&uptrend_bars(20));
        // close sits 1.0 under the bar high, range spans the whole window
        let v = values[19].unwrap();
        assert!(v > -10.0 && v <= 0.0, "got {}", v);
    }

    #[test]
    fn test_williams_flat_range() {
        let mut bars = uptrend_bars(14);
        for bar in &mut bars {
            bar.high = 10.0;
            bar.low = 10.0;
            bar.close = 10.0;
        }
        assert_eq!(WilliamsR::default().calculate(&bars)[13], None);
    }

    #[test]
    fn test_williams_custom_lookback() {
        let values = WilliamsR::new(3).calculate(&synthetic_bars(5));
        assert!(values[1].is_none());
        assert!(values[2].is_some());
    }
}
