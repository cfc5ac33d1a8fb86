use std::env;
use std::time::Duration;

use crate::error::ViewerError;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub lichess_token: Option<String>,
    pub lichess_explorer_url: String,
    pub lichess_api_url: String,
    pub current_user: Option<String>,
    pub autoplay_interval_ms: u64,
    pub http_timeout_secs: u64,
    pub snapshot_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/v1".to_string(),
            api_token: None,
            lichess_token: None,
            lichess_explorer_url: "https://explorer.lichess.ovh".to_string(),
            lichess_api_url: "https://lichess.org".to_string(),
            current_user: None,
            autoplay_interval_ms: 2000,
            http_timeout_secs: 30,
            snapshot_path: "data/session.bin".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env::var("API_BASE_URL").unwrap_or(defaults.api_base_url),
            api_token: env::var("API_TOKEN").ok().filter(|v| !v.is_empty()),
            lichess_token: env::var("LICHESS_TOKEN").ok().filter(|v| !v.is_empty()),
            lichess_explorer_url: env::var("LICHESS_EXPLORER_URL")
                .unwrap_or(defaults.lichess_explorer_url),
            lichess_api_url: env::var("LICHESS_API_URL").unwrap_or(defaults.lichess_api_url),
            current_user: env::var("CURRENT_USER").ok().filter(|v| !v.is_empty()),
            autoplay_interval_ms: env::var("AUTOPLAY_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.autoplay_interval_ms),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
            snapshot_path: env::var("SNAPSHOT_PATH").unwrap_or(defaults.snapshot_path),
        }
    }

    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ViewerError> {
        if self.autoplay_interval_ms == 0 {
            return Err(ViewerError::Config("AUTOPLAY_INTERVAL_MS must be greater than zero"));
        }
        if self.api_base_url.is_empty() {
            return Err(ViewerError::Config("API_BASE_URL must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.autoplay_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = Config {
            autoplay_interval_ms: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ViewerError::Config(_))));
    }
}
