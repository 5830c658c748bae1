//! Configuration management for txconsole
//!
//! This module handles loading, validation, and management of
//! txconsole configuration from YAML files, plus the overrides that
//! come from the environment and the command line.

pub mod error;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::ConfigError;

/// Environment variable holding the transaction API base URL
pub const API_ENDPOINT_ENV: &str = "API_ENDPOINT";

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

/// Remote transaction API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://abc.execute-api.us-east-1.amazonaws.com`
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Detail editor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Quiet period in milliseconds before an edit is saved
    #[serde(default = "default_save_delay_ms")]
    pub save_delay_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            save_delay_ms: default_save_delay_ms(),
        }
    }
}

fn default_save_delay_ms() -> u64 {
    500
}

/// Initial filter shown when a console session starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// First year offered by the year selector
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    #[serde(default = "default_year")]
    pub default_year: i32,
    #[serde(default = "default_month")]
    pub default_month: u32,
    #[serde(default = "default_true")]
    pub default_is_fraud: bool,
    #[serde(default)]
    pub default_page_size: PageSize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            start_year: default_start_year(),
            default_year: default_year(),
            default_month: default_month(),
            default_is_fraud: true,
            default_page_size: PageSize::default(),
        }
    }
}

fn default_start_year() -> i32 {
    2015
}

fn default_year() -> i32 {
    2016
}

fn default_month() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Console session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Maximum number of live browser sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_max_sessions() -> usize {
    64
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Page size enumeration offered by the filter editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    Ten,
    Twenty,
    Fifty,
    OneHundred,
    TwoHundred,
    FiveHundred,
}

impl PageSize {
    /// All choices in display order
    pub const ALL: [PageSize; 6] = [
        PageSize::Ten,
        PageSize::Twenty,
        PageSize::Fifty,
        PageSize::OneHundred,
        PageSize::TwoHundred,
        PageSize::FiveHundred,
    ];

    pub fn value(self) -> u32 {
        match self {
            PageSize::Ten => 10,
            PageSize::Twenty => 20,
            PageSize::Fifty => 50,
            PageSize::OneHundred => 100,
            PageSize::TwoHundred => 200,
            PageSize::FiveHundred => 500,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::OneHundred
    }
}

impl TryFrom<u32> for PageSize {
    type Error = String;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PageSize::ALL
            .into_iter()
            .find(|p| p.value() == value)
            .ok_or_else(|| format!("Invalid page size: {}", value))
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.value()
    }
}

impl std::str::FromStr for PageSize {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid page size: {}", s))?;
        PageSize::try_from(value)
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Detail editor settings
    #[serde(default)]
    pub editor: EditorConfig,
    /// Initial filter settings
    #[serde(default)]
    pub filter: FilterConfig,
    /// Session settings
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::IoError {
                path: path.display().to_string(),
                message: e.to_string(),
            },
        })?;

        let config = Self::from_yaml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from YAML text without validating it
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })
    }

    /// Apply an endpoint coming from the environment or the command line
    pub fn with_api_endpoint(mut self, endpoint: Option<String>) -> Self {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.api.endpoint = Some(endpoint.trim().to_string());
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if let Some(ref endpoint) = self.api.endpoint {
            parse_endpoint(endpoint)?;
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if self.editor.save_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "editor.save_delay_ms".to_string(),
                reason: "Save delay must be greater than 0".to_string(),
            });
        }

        if !(1..=12).contains(&self.filter.default_month) {
            return Err(ConfigError::InvalidValue {
                field: "filter.default_month".to_string(),
                reason: "Month must be between 1 and 12".to_string(),
            });
        }

        let current_year = chrono::Local::now().year();
        if self.filter.start_year > current_year {
            return Err(ConfigError::InvalidValue {
                field: "filter.start_year".to_string(),
                reason: format!("Start year must not be after {}", current_year),
            });
        }
        if self.filter.default_year < self.filter.start_year || self.filter.default_year > current_year {
            return Err(ConfigError::InvalidValue {
                field: "filter.default_year".to_string(),
                reason: format!(
                    "Default year must be between {} and {}",
                    self.filter.start_year, current_year
                ),
            });
        }

        if self.sessions.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sessions.max_sessions".to_string(),
                reason: "At least one session must be allowed".to_string(),
            });
        }

        Ok(())
    }

    /// The configured API endpoint, required unless running in demo mode
    pub fn require_endpoint(&self) -> Result<url::Url, ConfigError> {
        match self.api.endpoint {
            Some(ref endpoint) => parse_endpoint(endpoint),
            None => Err(ConfigError::MissingField {
                field: "api.endpoint".to_string(),
            }),
        }
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Socket address the console listens on
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Path of the default configuration file
    pub fn default_path() -> PathBuf {
        PathBuf::from("config.yaml")
    }
}

fn parse_endpoint(endpoint: &str) -> Result<url::Url, ConfigError> {
    let url = url::Url::parse(endpoint).map_err(|e| ConfigError::InvalidValue {
        field: "api.endpoint".to_string(),
        reason: format!("Not a valid URL ({}): {}", e, endpoint),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidValue {
            field: "api.endpoint".to_string(),
            reason: format!("Unsupported scheme '{}', expected http or https", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses_and_validates() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.editor.save_delay_ms, 500);
        assert_eq!(config.filter.default_page_size, PageSize::OneHundred);
        assert_eq!(config.filter.start_year, 2015);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert!(config.api.endpoint.is_none());
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.sessions.max_sessions, 64);
        assert_eq!(config.logging.level, "info");
        assert!(config.filter.default_is_fraud);
    }

    #[test]
    fn test_endpoint_override() {
        let config = Config::default().with_api_endpoint(Some(" https://api.example.com ".to_string()));
        assert_eq!(config.api.endpoint.as_deref(), Some("https://api.example.com"));

        let config = config.with_api_endpoint(Some("".to_string()));
        assert_eq!(config.api.endpoint.as_deref(), Some("https://api.example.com"));

        let url = config.require_endpoint().unwrap();
        assert_eq!(url.host_str(), Some("api.example.com"));
    }

    #[test]
    fn test_missing_endpoint() {
        let err = Config::default().require_endpoint().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field == "api.endpoint"));
    }

    #[test]
    fn test_invalid_values() {
        let config = Config::from_yaml("api:\n  endpoint: \"ftp://files.example.com\"").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let config = Config::from_yaml("filter:\n  default_month: 13").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { ref field, .. }) if field == "filter.default_month"));

        let config = Config::from_yaml("editor:\n  save_delay_ms: 0").unwrap();
        assert!(config.validate().is_err());

        let config = Config::from_yaml("filter:\n  default_year: 2010").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_page_size_is_rejected() {
        let result = Config::from_yaml("filter:\n  default_page_size: 250");
        assert!(matches!(result, Err(ConfigError::InvalidYaml { .. })));
    }

    #[test]
    fn test_page_size_conversions() {
        assert_eq!("200".parse::<PageSize>(), Ok(PageSize::TwoHundred));
        assert!("25".parse::<PageSize>().is_err());
        assert!("abc".parse::<PageSize>().is_err());
        assert_eq!(PageSize::FiveHundred.to_string(), "500");
        let values: Vec<u32> = PageSize::ALL.iter().map(|p| p.value()).collect();
        assert_eq!(values, vec![10, 20, 50, 100, 200, 500]);
    }

    #[test]
    fn test_load_missing_file() {
        let path = Path::new("/definitely/not/here/config.yaml");
        assert!(matches!(Config::load(path), Err(ConfigError::FileNotFound { .. })));
        assert!(Config::load_or_default(path).is_ok());
    }
}
