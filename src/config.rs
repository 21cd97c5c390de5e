//! Runtime configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_STORE_DIR: &str = ".widgetboard";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: `{value}`")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTimeouts {
    pub connect_secs: u64,
    /// `None` means requests may take as long as the backend needs.
    pub request_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL without a trailing slash, e.g. `https://host/api`.
    pub base_url: String,
    /// Sent verbatim as the `Authorization` header when set.
    pub auth: Option<String>,
    pub timeouts: ApiTimeouts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api: ApiConfig,
    /// Directory holding the saved-widget slot file.
    pub store_dir: PathBuf,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `WIDGETBOARD_API_BASE_URL`: default `http://127.0.0.1:8080/api`
    /// - `WIDGETBOARD_API_AUTH`: `Authorization` header value
    /// - `WIDGETBOARD_STORE_DIR`: default `.widgetboard`
    /// - `WIDGETBOARD_CONNECT_TIMEOUT_SECS`: default 10
    /// - `WIDGETBOARD_REQUEST_TIMEOUT_SECS`: unset means no request timeout
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a timeout is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_string("WIDGETBOARD_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let timeouts = ApiTimeouts {
            connect_secs: env_parse("WIDGETBOARD_CONNECT_TIMEOUT_SECS")?.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_secs: env_parse("WIDGETBOARD_REQUEST_TIMEOUT_SECS")?,
        };
        Ok(Self {
            api: ApiConfig {
                base_url: normalize_base_url(&base_url),
                auth: env_string("WIDGETBOARD_API_AUTH"),
                timeouts,
            },
            store_dir: env_string("WIDGETBOARD_STORE_DIR").map_or_else(|| PathBuf::from(DEFAULT_STORE_DIR), PathBuf::from),
        })
    }
}

/// Strip trailing slashes so paths can be appended with `/`.
#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// A non-blank env var.
fn env_string(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn env_parse(key: &'static str) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = env_string(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(ConfigError::Invalid { var: key, value: raw }),
    }
}
