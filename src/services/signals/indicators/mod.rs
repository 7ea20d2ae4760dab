//! Technical indicator implementations.
//!
//! Every indicator runs over the whole bar series and returns one value per
//! bar, `None` while the indicator is still warming up.

pub mod ad_line;
pub mod mfi;
pub mod obv;
pub mod rsi;
pub mod stochastic;
pub mod williams;

pub use ad_line::AccumulationDistribution;
pub use mfi::Mfi;
pub use obv::Obv;
pub use rsi::Rsi;
pub use stochastic::Stochastic;
pub use williams::WilliamsR;

use crate::types::{IndicatorRow, PriceBar};
use tracing::debug;

/// Number of leading bars that never produce a complete indicator row with the default windows.
pub fn warm_up_bars() -> usize {
    [
        Rsi::default().min_periods(),
        Stochastic::default().min_periods(),
        WilliamsR::default().min_periods(),
        Mfi::default().min_periods(),
        Obv.min_periods(),
        AccumulationDistribution.min_periods(),
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
        - 1
}

/// Compute every indicator the models were trained on and drop rows with undefined values.
pub fn compute_rows(bars: &[PriceBar]) -> Vec<IndicatorRow> {
    let rsi = Rsi::default().calculate(bars);
    let stochastic = Stochastic::default().calculate(bars);
    let williams_r = WilliamsR::default().calculate(bars);
    let mfi = Mfi::default().calculate(bars);
    let ad_line = AccumulationDistribution.calculate(bars);
    let obv = Obv.calculate(bars);

    let rows: Vec<IndicatorRow> = bars
        .iter()
        .enumerate()
        .filter_map(|(i, bar)| {
            Some(IndicatorRow {
                date: bar.date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                adj_close: bar.close,
                rsi: rsi[i]?,
                stoch_k: stochastic.k[i]?,
                stoch_d: stochastic.d[i]?,
                williams_r: williams_r[i]?,
                mfi: mfi[i]?,
                ad_line: ad_line[i]?,
                obv: obv[i]?,
            })
        })
        .collect();

    debug!(
        "Computed indicators: {} bars -> {} complete rows",
        bars.len(),
        rows.len()
    );
    rows
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::PriceBar;
    use chrono::{Duration, NaiveDate};

    /// Deterministic zig-zag series with a gentle trend.
    pub fn synthetic_bars(count: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        (0..count)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.3 + ((i % 7) as f64 - 3.0) * 1.2;
                PriceBar {
                    date: start + Duration::days(i as i64),
                    open: base - 0.5,
                    high: base + 1.5,
                    low: base - 1.5,
                    close: base,
                    volume: 1_000.0 + (i % 5) as f64 * 150.0,
                }
            })
            .collect()
    }

    pub fn uptrend_bars(count: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        (0..count)
            .map(|i| {
                let base = 100.0 + i as f64 * 1.5;
                PriceBar {
                    date: start + Duration::days(i as i64),
                    open: base,
                    high: base + 2.0,
                    low: base - 1.0,
                    close: base + 1.0,
                    volume: 1000.0,
                }
            })
            .collect()
    }
}
