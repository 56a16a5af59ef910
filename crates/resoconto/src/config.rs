//! Configuration loading from environment variables.

use std::time::Duration;
use tracing::warn;

pub const API_BASE_VAR: &str = "RESOCONTO_API_BASE";
pub const POLL_INTERVAL_VAR: &str = "REPORT_POLL_INTERVAL_MS";
pub const POLL_TIMEOUT_VAR: &str = "REPORT_POLL_TIMEOUT_MS";

pub const DEFAULT_API_BASE: &str = "http://localhost:8999/v1";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Spacing and overall deadline of the generation polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Read `REPORT_POLL_INTERVAL_MS` / `REPORT_POLL_TIMEOUT_MS` through
    /// `lookup`, keeping the defaults for missing or invalid values
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            interval: parse_millis(
                POLL_INTERVAL_VAR,
                lookup(POLL_INTERVAL_VAR).as_deref(),
                DEFAULT_POLL_INTERVAL,
            ),
            timeout: parse_millis(
                POLL_TIMEOUT_VAR,
                lookup(POLL_TIMEOUT_VAR).as_deref(),
                DEFAULT_POLL_TIMEOUT,
            ),
        }
    }
}

/// Parse a millisecond value that must be a positive finite number
pub fn parse_millis(name: &str, raw: Option<&str>, default: Duration) -> Duration {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return default;
    };

    let parsed = raw
        .parse::<f64>()
        .ok()
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok());

    match parsed {
        Some(duration) => duration,
        None => {
            warn!(var = name, value = raw, default_ms = default.as_millis() as u64, "Invalid duration, using default");
            default
        }
    }
}

/// Client settings: backend location and polling behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub poll: PollConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            poll: PollConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Self {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base = lookup(API_BASE_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            api_base,
            poll: PollConfig::from_lookup(lookup),
        }
    }
}
