//! Stochastic Oscillator indicator.

use crate::types::PriceBar;

/// Stochastic Oscillator.
///
/// Compares closing price to price range over a period:
/// %K = (Current Close - Lowest Low) / (Highest High - Lowest Low) * 100
///
/// %D is the simple moving average of %K over `d_period` bars. %K is undefined
/// when the window has no range, and so is every %D that averages it.
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
}

/// Aligned %K and %D series.
#[derive(Debug, Clone)]
pub struct StochasticSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
        }
    }
}

/// Lowest low and highest high over `bars`.
pub(crate) fn price_range(bars: &[PriceBar]) -> (f64, f64) {
    let lowest_low = bars.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let highest_high = bars
        .iter()
        .map(|c| c.high)
        .fold(f64::NEG_INFINITY, f64::max);
    (lowest_low, highest_high)
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        Self { k_period, d_period }
    }

    /// Bars needed before %D is defined.
    pub fn min_periods(&self) -> usize {
        self.k_period + self.d_period - 1
    }

    pub fn calculate(&self, bars: &[PriceBar]) -> StochasticSeries {
        let n = bars.len();
        let mut k = vec![None; n];
        let mut d = vec![None; n];
        if self.k_period == 0 || self.d_period == 0 || n < self.k_period {
            return StochasticSeries { k, d };
        }

        for i in (self.k_period - 1)..n {
            let window = &bars[(i + 1 - self.k_period)..=i];
            let (lowest_low, highest_high) = price_range(window);

            k[i] = (highest_high != lowest_low)
                .then(|| ((bars[i].close - lowest_low) / (highest_high - lowest_low)) * 100.0);
        }

        for i in (self.min_periods() - 1)..n {
            let recent = &k[(i + 1 - self.d_period)..=i];
            let sum: Option<f64> = recent.iter().copied().sum();
            d[i] = sum.map(|s| s / self.d_period as f64);
        }

        StochasticSeries { k, d }
    }
}
