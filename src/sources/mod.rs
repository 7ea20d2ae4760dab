//! Daily price data providers.

pub mod yahoo;

pub use yahoo::YahooFinanceClient;

use crate::error::SignalError;
use crate::types::PriceBar;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of daily OHLCV bars.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Daily bars dated in `[start, end)`, oldest first.
    ///
    /// An empty result is reported as [`SignalError::DataUnavailable`].
    async fn daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, SignalError>;

    /// Bars for a named look-back period such as `1y` at the given interval such as `1d`.
    async fn history(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<PriceBar>, SignalError>;
}
