use std::{env, fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures while resolving the client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {0}")]
    Parse(String),
    /// The file extension is not a supported format.
    #[error("unsupported configuration format; use 'yaml' or 'json'")]
    UnsupportedFormat,
    /// A resolved value failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The main configuration structure for the DealClosed client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the DealClosed backend, including the `/api` prefix
    pub api_base_url: String,

    /// Logging level
    pub log_level: String,

    /// Per-request timeout in seconds for REST calls
    pub request_timeout_secs: u64,
}

impl Config {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            log_level: "info".to_string(),
            request_timeout_secs: 30,
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Resolution order mirrors precedence: defaults, then the file (when
    /// provided), then `DEALCLOSED_*` environment variables for values still
    /// at their default, then the explicit override argument.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the file cannot be read or parsed, or
    /// when a resolved value fails validation.
    pub fn load_config(
        config_path: Option<PathBuf>,
        base_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::with_defaults();

        // Load from file if provided
        if let Some(path) = config_path {
            let content = fs::read_to_string(&path)?;
            let file_config: Self = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => serde_yml::from_str(&content)
                    .map_err(|err| ConfigError::Parse(err.to_string()))?,
                Some("json") => serde_json::from_str(&content)
                    .map_err(|err| ConfigError::Parse(err.to_string()))?,
                _ => return Err(ConfigError::UnsupportedFormat),
            };
            config = file_config;
        }

        // Use environment variables only if values are not already set
        let defaults = Self::with_defaults();
        if config.api_base_url == defaults.api_base_url {
            if let Ok(base_url) = env::var("DEALCLOSED_API_BASE_URL") {
                config.api_base_url = base_url;
            }
        }
        if config.log_level == defaults.log_level {
            if let Ok(log_level) = env::var("DEALCLOSED_LOG_LEVEL") {
                config.log_level = log_level;
            }
        }
        if config.request_timeout_secs == defaults.request_timeout_secs {
            if let Ok(timeout) = env::var("DEALCLOSED_REQUEST_TIMEOUT_SECS") {
                config.request_timeout_secs = timeout.parse().map_err(|_| {
                    ConfigError::Invalid(
                        "DEALCLOSED_REQUEST_TIMEOUT_SECS must be a positive integer".to_string(),
                    )
                })?;
            }
        }

        // Override with command-line arguments if provided
        if let Some(base_url) = base_url_override {
            config.api_base_url = base_url;
        }

        // Validate configuration
        if config.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "api_base_url must not be empty".to_string(),
            ));
        }
        if config.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::with_defaults();
        assert_eq!(config.api_base_url, "http://localhost:8080/api");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    #[serial]
    fn test_load_without_file_uses_defaults() {
        let config = Config::load_config(None, None).unwrap();
        assert_eq!(config, Config::with_defaults());
    }

    #[test]
    #[serial]
    fn test_load_from_json_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        write!(
            file,
            r#"{{"api_base_url":"https://api.dealclosed.example/api","log_level":"debug","request_timeout_secs":10}}"#
        )
        .unwrap();

        let config = Config::load_config(Some(file.path().to_path_buf()), None).unwrap();
        assert_eq!(config.api_base_url, "https://api.dealclosed.example/api");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    #[serial]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(file, "api_base_url: https://api.dealclosed.example/api").unwrap();
        writeln!(file, "log_level: warn").unwrap();
        writeln!(file, "request_timeout_secs: 5").unwrap();

        let config = Config::load_config(Some(file.path().to_path_buf()), None).unwrap();
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    #[serial]
    fn test_unsupported_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let result = Config::load_config(Some(file.path().to_path_buf()), None);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat)));
    }

    #[test]
    #[serial]
    fn test_env_override_applies_when_default() {
        unsafe {
            env::set_var("DEALCLOSED_API_BASE_URL", "https://env.dealclosed.example/api");
        }
        let config = Config::load_config(None, None).unwrap();
        unsafe {
            env::remove_var("DEALCLOSED_API_BASE_URL");
        }
        assert_eq!(config.api_base_url, "https://env.dealclosed.example/api");
    }

    #[test]
    #[serial]
    fn test_explicit_override_wins() {
        let config =
            Config::load_config(None, Some("https://cli.dealclosed.example/api".to_string()))
                .unwrap();
        assert_eq!(config.api_base_url, "https://cli.dealclosed.example/api");
    }

    #[test]
    #[serial]
    fn test_zero_timeout_is_invalid() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        write!(
            file,
            r#"{{"api_base_url":"http://localhost:8080/api","log_level":"info","request_timeout_secs":0}}"#
        )
        .unwrap();

        let result = Config::load_config(Some(file.path().to_path_buf()), None);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
