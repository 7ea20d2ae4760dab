//! Accumulation/Distribution line.

use crate::types::PriceBar;

/// Accumulation/Distribution line.
///
/// Running sum of close-location value times volume:
/// CLV = ((Close - Low) - (High - Close)) / (High - Low)
pub struct AccumulationDistribution;

impl AccumulationDistribution {
    pub fn min_periods(&self) -> usize {
        1
    }

    pub fn calculate(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        bars.iter()
            .scan(0.0, |ad, bar| {
                let range = bar.high - bar.low;
                let clv = if range != 0.0 {
                    ((bar.close - bar.low) - (bar.high - bar.close)) / range
                } else {
                    0.0
                };
                *ad += clv * bar.volume;
                Some(Some(*ad))
            })
            .collect()
    }
}
