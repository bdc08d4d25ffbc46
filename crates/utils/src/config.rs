//! Unified client configuration.
//!
//! One contract for everything the client reads from its environment:
//! the backend base URL, the deployment environment, the client version
//! and an optional telemetry DSN.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback backend address when `ARRADM_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:8765";

pub const ENV_API_URL: &str = "ARRADM_API_URL";
pub const ENV_ENVIRONMENT: &str = "ARRADM_ENV";
pub const ENV_VERSION: &str = "ARRADM_VERSION";
pub const ENV_TELEMETRY_DSN: &str = "ARRADM_TELEMETRY_DSN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment `{0}`: expected `development` or `production`")]
    InvalidEnvironment(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend API, without a trailing slash.
    pub api_url: String,
    pub environment: Environment,
    pub version: String,
    /// DSN for the error-reporting service; telemetry is disabled when unset.
    pub telemetry_endpoint: Option<String>,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup. Empty
    /// values are treated the same as unset ones.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| get(key).filter(|value| !value.is_empty());

        let environment = match get(ENV_ENVIRONMENT).as_deref() {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => return Err(ConfigError::InvalidEnvironment(other.to_string())),
        };

        Ok(Self {
            api_url: get(ENV_API_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            environment,
            version: get(ENV_VERSION).unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            telemetry_endpoint: get(ENV_TELEMETRY_DSN),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn defaults_when_environment_is_silent() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.environment, Environment::Development);
        assert!(config.telemetry_endpoint.is_none());
        assert!(!config.version.is_empty());
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::from_lookup(lookup(&[
            (ENV_API_URL, "http://grabarr.local:9000/"),
            (ENV_ENVIRONMENT, "production"),
            (ENV_VERSION, "2.4.0"),
            (ENV_TELEMETRY_DSN, "https://key@sentry.local/1"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://grabarr.local:9000");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.version, "2.4.0");
        assert_eq!(
            config.telemetry_endpoint.as_deref(),
            Some("https://key@sentry.local/1")
        );
    }

    #[test]
    fn empty_values_fall_back() {
        let config =
            Config::from_lookup(lookup(&[(ENV_API_URL, ""), (ENV_ENVIRONMENT, "")])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = Config::from_lookup(lookup(&[(ENV_ENVIRONMENT, "staging")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvironment(ref v) if v == "staging"));
    }
}
