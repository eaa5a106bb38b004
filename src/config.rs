//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::error::{DeckError, Result};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_BRIDGE_WARMUP_MS: u64 = 2500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckConfig {
    /// Persistence API root, without a trailing slash.
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Quiet window for debounced field-group writes.
    pub debounce: Duration,
    /// Delay between render-host boot and bridge readiness.
    pub bridge_warmup: Duration,
}

impl DeckConfig {
    /// Config with defaults for everything except the API root.
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            bridge_warmup: Duration::from_millis(DEFAULT_BRIDGE_WARMUP_MS),
        }
    }

    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `DECK_API_BASE_URL`
    ///
    /// Optional:
    /// - `DECK_REQUEST_TIMEOUT_SECS`: default 5
    /// - `DECK_CONNECT_TIMEOUT_SECS`: default 5
    /// - `DECK_DEBOUNCE_MS`: default 1000
    /// - `DECK_BRIDGE_WARMUP_MS`: default 2500
    ///
    /// # Errors
    ///
    /// Returns `Config` if `DECK_API_BASE_URL` is unset or empty.
    pub fn from_env() -> Result<Self> {
        let base = std::env::var("DECK_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| DeckError::Config("DECK_API_BASE_URL not set".into()))?;
        Ok(Self::from_env_with_base(&base))
    }

    /// Like [`Self::from_env`], with the API root supplied by the caller.
    #[must_use]
    pub fn from_env_with_base(base: &str) -> Self {
        Self::from_lookup(base, |key| std::env::var(key).ok())
    }

    fn from_lookup(base: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str, default: u64| parse_u64(lookup(key).as_deref(), default);
        Self {
            request_timeout: Duration::from_secs(parse("DECK_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)),
            connect_timeout: Duration::from_secs(parse("DECK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)),
            debounce: Duration::from_millis(parse("DECK_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)),
            bridge_warmup: Duration::from_millis(parse("DECK_BRIDGE_WARMUP_MS", DEFAULT_BRIDGE_WARMUP_MS)),
            ..Self::new(base)
        }
    }
}

fn parse_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
