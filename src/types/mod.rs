pub mod price;
pub mod signals;

pub use price::*;
pub use signals::*;

/// Normalized company identifier used to key model artifacts: the ticker up to its exchange suffix.
///
/// `RELIANCE.NS` and `RELIANCE.BO` both resolve to `RELIANCE`.
pub fn company_id(ticker: &str) -> &str {
    ticker.split_once('.').map_or(ticker, |(company, _)| company)
}
