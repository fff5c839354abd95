//! Client Configuration
//!
//! Defaults live under the user data directory; environment variables
//! override each field.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://app.admss.com/api/v1/";
pub const DEFAULT_ROWS_PER_PAGE: u32 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const APP_DIR: &str = "dealer-dashboard";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the REST API, always ending in `/`
    pub api_url: String,
    /// JSON file backing the session key/value store
    pub storage_path: PathBuf,
    pub log_dir: PathBuf,
    pub request_timeout: Duration,
    pub rows_per_page: u32,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR);
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_path: data_dir.join("local-storage.json"),
            log_dir: data_dir.join("logs"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

impl Config {
    /// Defaults overridden by `DEALER_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("DEALER_API_URL") {
            config.api_url = normalize_base_url("DEALER_API_URL", &url)?;
        }
        if let Some(path) = lookup("DEALER_STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("DEALER_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("DEALER_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_number("DEALER_REQUEST_TIMEOUT_SECS", &secs)?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(rows) = lookup("DEALER_ROWS_PER_PAGE") {
            config.rows_per_page = parse_number("DEALER_ROWS_PER_PAGE", &rows)?;
        }
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr + PartialOrd + Default>(
    key: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

fn normalize_base_url(key: &'static str, url: &str) -> Result<String, ConfigError> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            key,
            value: url.to_string(),
        });
    }
    if url.ends_with('/') {
        Ok(url.to_string())
    } else {
        Ok(format!("{}/", url))
    }
}
