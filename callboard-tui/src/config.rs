//! Configuration loading for the CALLBOARD TUI.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuiConfig {
    pub api_base_url: String,
    pub auth: AuthConfig,
    pub request_timeout_ms: u64,
    pub refresh_interval_ms: u64,
    pub persistence_path: PathBuf,
    pub log_path: PathBuf,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
    pub theme: ThemeConfig,
}

/// Either a ready bearer token or credentials for `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub ceiling_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfig {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or CALLBOARD_TUI_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl TuiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: TuiConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(invalid("api_base_url", "must not be empty"));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(invalid("api_base_url", "must start with http:// or https://"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", "must be > 0"));
        }
        if self.refresh_interval_ms == 0 {
            return Err(invalid("refresh_interval_ms", "must be > 0"));
        }
        if self.persistence_path.as_os_str().is_empty() {
            return Err(invalid("persistence_path", "must not be empty"));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(invalid("log_path", "must not be empty"));
        }
        self.auth.validate()?;
        if self.polling.interval_ms == 0 {
            return Err(invalid("polling.interval_ms", "must be > 0"));
        }
        if self.polling.ceiling_ms < self.polling.interval_ms {
            return Err(invalid("polling.ceiling_ms", "must be >= interval_ms"));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(invalid("logging.filter", "must not be empty"));
        }
        if self.theme.name.trim().is_empty() {
            return Err(invalid("theme.name", "must not be empty"));
        }
        if self.theme.name.to_ascii_lowercase() != "synthbrute" {
            return Err(invalid("theme.name", "only 'synthbrute' is supported"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    pub fn poll_ceiling(&self) -> Duration {
        Duration::from_millis(self.polling.ceiling_ms)
    }
}

impl AuthConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(token) = &self.token {
            if token.trim().is_empty() {
                return Err(invalid("auth.token", "must not be empty when set"));
            }
        }
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => {
                if email.trim().is_empty() || password.is_empty() {
                    return Err(invalid("auth", "email and password must not be empty"));
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(invalid("auth", "email and password must be provided together"));
            }
            (None, None) => {
                if self.token.is_none() {
                    return Err(invalid("auth", "token or email/password must be provided"));
                }
            }
        }
        Ok(())
    }

    /// Login credentials, when configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("CALLBOARD_TUI_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
api_base_url = "https://backoffice.example.com/api"
request_timeout_ms = 10000
refresh_interval_ms = 250
persistence_path = "state/callboard.json"
log_path = "state/callboard.log"

[auth]
email = "ops@example.com"
password = "hunter2"

[polling]
interval_ms = 10000
ceiling_ms = 300000

[logging]
filter = "callboard_tui=info"
json = false

[theme]
name = "synthbrute"
"#;

    #[test]
    fn test_sample_config_parses_and_validates() {
        let config = TuiConfig::from_toml(SAMPLE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.poll_ceiling(), Duration::from_secs(300));
        assert_eq!(config.auth.credentials(), Some(("ops@example.com", "hunter2")));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let contents = SAMPLE.replace("[auth]", "retry_forever = true\n\n[auth]");
        assert!(matches!(TuiConfig::from_toml(&contents), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_field_rejected() {
        let contents = SAMPLE.replace("request_timeout_ms = 10000\n", "");
        assert!(matches!(TuiConfig::from_toml(&contents), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = TuiConfig::from_path(file.path()).unwrap();
        assert_eq!(config.api_base_url, "https://backoffice.example.com/api");
    }

    #[test]
    fn test_ceiling_below_interval_rejected() {
        let mut config = TuiConfig::from_toml(SAMPLE).unwrap();
        config.polling.ceiling_ms = 5_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "polling.ceiling_ms", .. })
        ));
    }

    #[test]
    fn test_half_credentials_rejected() {
        let mut config = TuiConfig::from_toml(SAMPLE).unwrap();
        config.auth.password = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "auth", .. })
        ));
    }
}
