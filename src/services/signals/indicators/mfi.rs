//! Money Flow Index (MFI) indicator.

use crate::types::PriceBar;

/// MFI (Money Flow Index) indicator.
///
/// Volume-weighted RSI. Measures buying and selling pressure:
/// MFI = 100 - (100 / (1 + Money Flow Ratio))
pub struct Mfi {
    period: usize,
}

impl Default for Mfi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Mfi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn min_periods(&self) -> usize {
        self.period + 1
    }

    /// Undefined when the window carries no money flow in either direction.
    fn mfi_value(positive_flow: f64, negative_flow: f64) -> Option<f64> {
        if negative_flow == 0.0 {
            return (positive_flow != 0.0).then_some(100.0);
        }
        let money_flow_ratio = positive_flow / negative_flow;
        Some(100.0 - (100.0 / (1.0 + money_flow_ratio)))
    }

    /// MFI over the trailing `period` typical-price changes of every bar.
    pub fn calculate(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let mut out = vec![None; bars.len()];
        if self.period == 0 || bars.len() < self.min_periods() {
            return out;
        }

        // Signed money flow of each change; index j describes bars[j] vs bars[j - 1]
        let flows: Vec<(f64, f64)> = bars
            .windows(2)
            .map(|w| {
                let prev_tp = w[0].typical_price();
                let current_tp = w[1].typical_price();
                let money_flow = current_tp * w[1].volume;
                if current_tp > prev_tp {
                    (money_flow, 0.0)
                } else if current_tp < prev_tp {
                    (0.0, money_flow)
                } else {
                    (0.0, 0.0)
                }
            })
            .collect();

        for (i, window) in flows.windows(self.period).enumerate() {
            let (positive, negative) = window
                .iter()
                .fold((0.0, 0.0), |(p, n), (fp, fn_)| (p + fp, n + fn_));
            out[i + self.period] = Self::mfi_value(positive, negative);
        }

        out
    }
}
