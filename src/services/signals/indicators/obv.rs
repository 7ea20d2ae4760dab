//! On-Balance Volume (OBV) indicator.

use crate::types::PriceBar;

/// OBV (On-Balance Volume) indicator.
///
/// Cumulative volume indicator:
/// - If close < previous close: OBV -= volume
/// - Otherwise: OBV += volume
///
/// The first bar has no previous close and counts as an up bar.
pub struct Obv;

impl Obv {
    pub fn min_periods(&self) -> usize {
        1
    }

    pub fn calculate(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let mut prev_close: Option<f64> = None;
        bars.iter()
            .scan(0.0, |obv, bar| {
                match prev_close {
                    Some(prev) if bar.close < prev => *obv -= bar.volume,
                    _ => *obv += bar.volume,
                }
                prev_close = Some(bar.close);
                Some(Some(*obv))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::uptrend_bars;

    #[test]
    fn test_obv_accumulates() {
        let mut bars = uptrend_bars(4);
        bars[2].close = bars[1].close - 5.0;
        bars[3].close = bars[1].close + 5.0;
        let values = Obv.calculate(&bars);
        assert_eq!(
            values,
            vec![Some(1000.0), Some(2000.0), Some(1000.0), Some(2000.0)]
        );
    }

    #[test]
    fn test_obv_unchanged_close_adds_volume() {
        let mut bars = uptrend_bars(3);
        bars[0].volume = 1300.0;
        bars[1].volume = 150.0;
        bars[2].volume = 150.0;
        bars[2].close = bars[1].close;
        let values: Vec<f64> = Obv.calculate(&bars).into_iter().flatten().collect();
        assert_eq!(values, vec![1300.0, 1450.0, 1600.0]);
    }

    #[test]
    fn test_obv_empty() {
        assert!(Obv.calculate(&[]).is_empty());
    }
}
