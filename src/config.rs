use crate::services::signals::ScalingStrategy;
use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Window length the sequence models were trained with.
pub const DEFAULT_SEQUENCE_WINDOW: usize = 10;
/// Relative move under which a backtest prediction is a Hold.
pub const DEFAULT_BACKTEST_THRESHOLD: f64 = 0.05;
/// Relative move under which a next-day prediction is a Hold.
pub const DEFAULT_NEXT_DAY_THRESHOLD: f64 = 0.034;
pub const DEFAULT_TECHNICAL_WEIGHT: f64 = 0.8;
pub const DEFAULT_FINANCIAL_WEIGHT: f64 = 0.2;
/// Blended score beyond which the final signal is Buy (or below its negation, Sell).
pub const DEFAULT_BLEND_CUTOFF: f64 = 0.5;
pub const DEFAULT_NEXT_DAY_LOOKBACK_DAYS: i64 = 100;

/// First day of backtest history.
pub fn default_backtest_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 7, 7).unwrap_or_default()
}

/// Weights for blending the technical and quarterly financial signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub technical: f64,
    pub financial: f64,
    pub cutoff: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            technical: DEFAULT_TECHNICAL_WEIGHT,
            financial: DEFAULT_FINANCIAL_WEIGHT,
            cutoff: DEFAULT_BLEND_CUTOFF,
        }
    }
}

/// Tunables of the signal pipeline.
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Number of consecutive feature rows per model input.
    pub window: usize,
    pub backtest_threshold: f64,
    pub next_day_threshold: f64,
    pub blend: BlendWeights,
    pub backtest_start: NaiveDate,
    /// Calendar days of history fetched for a next-day prediction.
    pub next_day_lookback_days: i64,
    pub scaling: ScalingStrategy,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_SEQUENCE_WINDOW,
            backtest_threshold: DEFAULT_BACKTEST_THRESHOLD,
            next_day_threshold: DEFAULT_NEXT_DAY_THRESHOLD,
            blend: BlendWeights::default(),
            backtest_start: default_backtest_start(),
            next_day_lookback_days: DEFAULT_NEXT_DAY_LOOKBACK_DAYS,
            scaling: ScalingStrategy::PerRequest,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Directory holding per-company models, feature indices and the residual table.
    pub models_dir: PathBuf,
    /// Directory holding per-company quarterly financial signal tables.
    pub financial_signals_dir: PathBuf,
    /// Directory the backtest result files are written to.
    pub output_dir: PathBuf,
    /// Registered model format used to load sequence models.
    pub model_format: String,
    /// Yahoo Finance API base URL.
    pub yahoo_base_url: String,
    pub signals: SignalConfig,
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid {}={:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = SignalConfig::default();

        let backtest_start = env::var("BACKTEST_START")
            .ok()
            .and_then(|v| match NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    warn!("Ignoring invalid BACKTEST_START={:?}, using default", v);
                    None
                }
            })
            .unwrap_or(defaults.backtest_start);

        let signals = SignalConfig {
            window: parse_env("SEQUENCE_WINDOW", defaults.window),
            backtest_threshold: parse_env("BACKTEST_THRESHOLD", defaults.backtest_threshold),
            next_day_threshold: parse_env("NEXT_DAY_THRESHOLD", defaults.next_day_threshold),
            blend: BlendWeights {
                technical: parse_env("TECHNICAL_WEIGHT", defaults.blend.technical),
                financial: parse_env("FINANCIAL_WEIGHT", defaults.blend.financial),
                cutoff: parse_env("BLEND_CUTOFF", defaults.blend.cutoff),
            },
            backtest_start,
            next_day_lookback_days: parse_env(
                "NEXT_DAY_LOOKBACK_DAYS",
                defaults.next_day_lookback_days,
            ),
            scaling: parse_env("SCALING_STRATEGY", defaults.scaling),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 8000),
            models_dir: env::var("MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models")),
            financial_signals_dir: env::var("FINANCIAL_SIGNALS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("financial_signals")),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("outputs")),
            model_format: env::var("MODEL_FORMAT")
                .unwrap_or_else(|_| crate::services::model::ATTENTION_LSTM_FORMAT.to_string()),
            yahoo_base_url: env::var("YAHOO_BASE_URL")
                .unwrap_or_else(|_| "https://query1.finance.yahoo.com".to_string()),
            signals,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
