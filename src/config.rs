//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MATCH_SCORING_CONFIG_PATH";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MATCH_API_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// TCP port the HTTP server binds to.
    pub port: u16,
    /// Directory of the file-backed scoring cache; in-memory when unset.
    pub storage_dir: Option<PathBuf>,
    /// Base URL of the match backend; offline when unset.
    pub match_api_base_url: Option<String>,
    /// Upper bound for a single backend request.
    pub match_api_timeout: Duration,
    /// Capacity of the notice broadcast channel.
    pub notice_capacity: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    ///
    /// `PORT` (or `SERVER_PORT`) overrides the configured port.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                Self::default()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_port_override(env_port())
    }

    fn from_json(contents: &str) -> serde_json::Result<Self> {
        let raw: RawConfig = serde_json::from_str(contents)?;
        let config: Self = raw.into();
        info!(
            storage_dir = ?config.storage_dir,
            match_api = ?config.match_api_base_url,
            "loaded config"
        );
        Ok(config)
    }

    fn with_port_override(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            storage_dir: None,
            match_api_base_url: None,
            match_api_timeout: Duration::from_millis(DEFAULT_MATCH_API_TIMEOUT_MS),
            notice_capacity: DEFAULT_NOTICE_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    port: Option<u16>,
    storage_dir: Option<PathBuf>,
    match_api_base_url: Option<String>,
    match_api_timeout_ms: Option<u64>,
    notice_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            port: value.port.unwrap_or(defaults.port),
            storage_dir: value.storage_dir,
            match_api_base_url: value
                .match_api_base_url
                .filter(|url| !url.trim().is_empty()),
            match_api_timeout: value
                .match_api_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.match_api_timeout),
            notice_capacity: value
                .notice_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.notice_capacity),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn env_port() -> Option<u16> {
    env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "match_api_base_url": "http://scores.local/api" }"#)
            .unwrap();

        assert_eq!(
            config.match_api_base_url.as_deref(),
            Some("http://scores.local/api")
        );
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.notice_capacity, DEFAULT_NOTICE_CAPACITY);
        assert_eq!(config.storage_dir, None);
    }

    #[test]
    fn blank_url_and_zero_capacity_fall_back() {
        let config =
            AppConfig::from_json(r#"{ "match_api_base_url": "  ", "notice_capacity": 0 }"#).unwrap();

        assert_eq!(config.match_api_base_url, None);
        assert_eq!(config.notice_capacity, DEFAULT_NOTICE_CAPACITY);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(AppConfig::from_json(r#"{ "colour": "red" }"#).is_err());
    }

    #[test]
    fn env_port_wins() {
        let config = AppConfig::default().with_port_override(Some(9001));
        assert_eq!(config.port, 9001);
        assert_eq!(AppConfig::default().with_port_override(None).port, DEFAULT_PORT);
    }
}
