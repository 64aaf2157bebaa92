//! Configuration loading for the Tally CLI.
//!
//! All fields are required. No defaults.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tally_core::ConfigError;
use tally_remote::RemoteConfig;
use tally_storage::FreshnessPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub bearer_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    pub list_ttl_secs: u64,
    pub detail_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl TallyConfig {
    /// Load and validate the file at `path`.
    ///
    /// `path` comes from `--config` or `TALLY_CONFIG`; clap resolves which.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api_base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.auth.bearer_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "auth.bearer_token",
                reason: "must not be empty".to_string(),
            });
        }
        if self.cache.list_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.list_ttl_secs",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cache.detail_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.detail_ttl_secs",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn remote_config(&self) -> RemoteConfig {
        RemoteConfig {
            base_url: self.api_base_url.clone(),
            bearer_token: self.auth.bearer_token.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn freshness_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(
            Duration::from_secs(self.cache.list_ttl_secs),
            Duration::from_secs(self.cache.detail_ttl_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
api_base_url = "https://api.example.com"
request_timeout_ms = 10000

[auth]
bearer_token = "opaque"

[cache]
list_ttl_secs = 120
detail_ttl_secs = 300

[logging]
format = "json"
"#;

    #[test]
    fn test_sample_parses_and_validates() {
        let config = TallyConfig::from_toml(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.freshness_policy(), FreshnessPolicy::default());
        let remote = config.remote_config();
        assert_eq!(remote.bearer_token, "opaque");
        assert_eq!(remote.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let contents = SAMPLE.replace("[auth]", "retries = 3\n\n[auth]");
        let err = TallyConfig::from_toml(&contents).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let contents = SAMPLE.replace("[logging]\nformat = \"json\"\n", "");
        assert!(matches!(
            TallyConfig::from_toml(&contents),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_path() {
        assert_eq!(
            TallyConfig::load(None).unwrap_err(),
            ConfigError::MissingConfigPath
        );
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        let err = TallyConfig::load(Some(Path::new("/nonexistent/tally.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
