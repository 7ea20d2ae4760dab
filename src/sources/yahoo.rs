//! Yahoo Finance API client for historical stock data.
//!
//! Uses the unofficial v8 chart API, which serves exchange-suffixed tickers
//! such as `RELIANCE.NS` as well as plain US symbols.

use super::PriceSource;
use crate::error::SignalError;
use crate::types::PriceBar;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    meta: YahooMeta,
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Normalize a ticker for the chart API. Exchange suffixes are kept.
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn unavailable(ticker: &str, reason: impl Into<String>) -> SignalError {
    SignalError::DataUnavailable {
        ticker: ticker.to_string(),
        reason: reason.into(),
    }
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Turn a chart response into bars, dropping timestamps without a complete OHLC quote.
fn parse_chart(ticker: &str, response: YahooChartResponse) -> Result<Vec<PriceBar>, SignalError> {
    if let Some(error) = response.chart.error {
        return Err(unavailable(
            ticker,
            format!("Yahoo API error: {} - {}", error.code, error.description),
        ));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| unavailable(ticker, "no results in response"))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &timestamp) in timestamps.iter().enumerate() {
        let field = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            continue;
        };
        if close <= 0.0 {
            continue;
        }

        // Daily bars are stamped at the exchange open; the local date is the trading day
        let Some(date) = DateTime::from_timestamp(timestamp + offset, 0).map(|dt| dt.date_naive())
        else {
            continue;
        };

        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0) as f64,
        });
    }

    if bars.is_empty() {
        return Err(unavailable(ticker, "no price data returned"));
    }
    Ok(bars)
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_chart(
        &self,
        ticker: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<PriceBar>, SignalError> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            normalize_yahoo_symbol(ticker)
        );
        debug!("Fetching Yahoo Finance data: {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| unavailable(ticker, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(unavailable(ticker, format!("API error: {}", response.status())));
        }

        let data: YahooChartResponse = response
            .json()
            .await
            .map_err(|e| unavailable(ticker, format!("Parse error: {}", e)))?;

        let bars = parse_chart(ticker, data)?;
        debug!("Yahoo Finance returned {} bars for {}", bars.len(), ticker);
        Ok(bars)
    }
}

#[async_trait]
impl PriceSource for YahooFinanceClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, SignalError> {
        if end <= start {
            return Err(unavailable(
                ticker,
                format!("empty date range {} to {}", start, end),
            ));
        }

        let query = [
            ("period1", day_start_timestamp(start).to_string()),
            // one day of slack for exchanges east of UTC, trimmed below
            (
                "period2",
                day_start_timestamp(end + ChronoDuration::days(1)).to_string(),
            ),
            ("interval", "1d".to_string()),
            ("includePrePost", "false".to_string()),
        ];
        let bars: Vec<PriceBar> = self
            .fetch_chart(ticker, &query)
            .await?
            .into_iter()
            .filter(|bar| bar.date >= start && bar.date < end)
            .collect();

        if bars.is_empty() {
            return Err(unavailable(
                ticker,
                format!("no bars between {} and {}", start, end),
            ));
        }
        Ok(bars)
    }

    async fn history(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<PriceBar>, SignalError> {
        let query = [
            ("range", period.to_string()),
            ("interval", interval.to_string()),
            ("includePrePost", "false".to_string()),
        ];
        self.fetch_chart(ticker, &query).await
    }
}
