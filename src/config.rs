//! Runtime configuration, read once from the environment (after `.env` is
//! loaded by the binary) and handed to the clients that need it.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com";
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_TOKEN_PATH: &str = ".geoinsight/token";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend_url: String,
    /// Sent as `x-api-key` on every backend request; may be empty.
    pub backend_api_key: String,
    pub openweather_key: Option<String>,
    pub countries_url: String,
    pub weather_url: String,
    pub timeout: Duration,
    pub token_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or_else(|| {
                debug!(key, default, "Config value not set, using default");
                default.to_string()
            })
        };

        let timeout_secs: u64 = get("GEOINSIGHT_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .context("GEOINSIGHT_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            backend_url: trim_base(get("GEOINSIGHT_BACKEND_URL", DEFAULT_BACKEND_URL)),
            backend_api_key: lookup("GEOINSIGHT_BACKEND_API_KEY").unwrap_or_default(),
            openweather_key: lookup("OPENWEATHERMAP_KEY").filter(|k| !k.trim().is_empty()),
            countries_url: trim_base(get("GEOINSIGHT_COUNTRIES_URL", DEFAULT_COUNTRIES_URL)),
            weather_url: trim_base(get("GEOINSIGHT_WEATHER_URL", DEFAULT_WEATHER_URL)),
            timeout: Duration::from_secs(timeout_secs),
            token_path: PathBuf::from(get("GEOINSIGHT_TOKEN_PATH", DEFAULT_TOKEN_PATH)),
        })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
