//! Configuration loading for the nightsync daemon.
//!
//! Configuration is loaded from a TOML file (default: `nightsync.toml`).
//! Only `nightscout.url` is required; every other field has a default.

use serde::Deserialize;
use sgv_client::{LedgerConfig, SchedulerConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "nightsync.toml";

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Destination configuration.
    pub nightscout: NightscoutConfig,
    /// Scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerSection,
    /// Reading source configuration.
    #[serde(default)]
    pub source: SourceConfig,
    /// HTTP endpoints configuration.
    #[serde(default)]
    pub http: HttpConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Destination (Nightscout) configuration.
#[derive(Clone, Deserialize)]
pub struct NightscoutConfig {
    /// Base URL of the Nightscout site.
    pub url: String,
    /// Shared API secret (sent SHA-1 hashed).
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for NightscoutConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NightscoutConfig")
            .field("url", &self.url)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "REDACTED"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Run the background scheduler (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sync interval in seconds (default: 300 = 5 minutes).
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,
}

/// Unit of the values in the readings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlucoseUnit {
    /// mg/dL, used as-is.
    #[default]
    Mgdl,
    /// mmol/L, converted to mg/dL on read.
    Mmol,
}

/// Reading source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// JSON file holding an array of readings (default: readings.json).
    #[serde(default = "default_readings_file")]
    pub readings_file: PathBuf,
    /// Unit of the values in the file (default: mgdl).
    #[serde(default)]
    pub unit: GlucoseUnit,
}

/// HTTP endpoints configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Serve the manual-trigger endpoints (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bind address for HTTP server (default: 127.0.0.1:8080).
    #[serde(default = "default_http_bind")]
    pub bind_address: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (default: info).
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_request_timeout() -> u64 {
    sgv_client::DEFAULT_TIMEOUT.as_secs()
}

fn default_true() -> bool {
    true
}

fn default_sync_interval() -> u64 {
    sgv_client::DEFAULT_SYNC_INTERVAL.as_secs()
}

fn default_readings_file() -> PathBuf {
    PathBuf::from("readings.json")
}

fn default_http_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sync_interval_secs: default_sync_interval(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            readings_file: default_readings_file(),
            unit: GlucoseUnit::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            bind_address: default_http_bind(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Configuration pointing at `url` with every other field defaulted.
    pub fn for_url(url: &str) -> Self {
        Self {
            nightscout: NightscoutConfig {
                url: url.to_string(),
                api_secret: None,
                request_timeout_secs: default_request_timeout(),
            },
            scheduler: SchedulerSection::default(),
            source: SourceConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load and validate configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()
    }

    /// Check field values and normalize the destination URL.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        let url = self.nightscout.url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            return Err(ConfigError::Invalid("nightscout.url is required".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "nightscout.url must start with http:// or https://, got {url}"
            )));
        }
        self.nightscout.url = url;

        if self.nightscout.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "nightscout.request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.scheduler.sync_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.sync_interval_secs must be greater than 0".into(),
            ));
        }

        Ok(self)
    }

    /// Destination client settings.
    pub fn ledger(&self) -> LedgerConfig {
        let config = LedgerConfig::new(&self.nightscout.url);
        match &self.nightscout.api_secret {
            Some(secret) => config.with_secret(secret),
            None => config,
        }
    }

    /// Scheduler settings.
    pub fn schedule(&self) -> SchedulerConfig {
        SchedulerConfig {
            sync_interval: Duration::from_secs(self.scheduler.sync_interval_secs),
        }
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.nightscout.request_timeout_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range or malformed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn minimal_config_uses_defaults() {
        let toml = r#"
[nightscout]
url = "https://ns.example.com"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        let config = config.validate().unwrap();
        assert_eq!(config.nightscout.api_secret, None);
        assert_eq!(config.nightscout.request_timeout_secs, 30);
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.sync_interval_secs, 300);
        assert_eq!(config.source.readings_file, PathBuf::from("readings.json"));
        assert_eq!(config.source.unit, GlucoseUnit::Mgdl);
        assert!(config.http.enabled);
        assert_eq!(config.http.bind_address, "127.0.0.1:8080");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[nightscout]
url = "http://localhost:1337/"
api_secret = "hunter2hunter2"
request_timeout_secs = 10

[scheduler]
enabled = false
sync_interval_secs = 60

[source]
readings_file = "/data/cgm.json"
unit = "mmol"

[http]
bind_address = "0.0.0.0:9090"

[logging]
level = "debug"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        let config = config.validate().unwrap();
        assert_eq!(config.nightscout.url, "http://localhost:1337");
        assert_eq!(config.nightscout.api_secret.as_deref(), Some("hunter2hunter2"));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(!config.scheduler.enabled);
        assert_eq!(config.schedule().sync_interval, Duration::from_secs(60));
        assert_eq!(config.source.readings_file, PathBuf::from("/data/cgm.json"));
        assert_eq!(config.source.unit, GlucoseUnit::Mmol);
        assert_eq!(config.http.bind_address, "0.0.0.0:9090");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn missing_nightscout_section_fails_to_parse() {
        let result: Result<Config, _> = toml::from_str("[scheduler]\nenabled = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_unit_fails_to_parse() {
        let toml = r#"
[nightscout]
url = "https://ns.example.com"
[source]
unit = "furlongs"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn url_must_be_http() {
        let err = Config::for_url("ftp://ns.example.com").validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = Config::for_url("  ").validate().unwrap_err();
        assert!(err.to_string().contains("nightscout.url is required"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = Config::for_url("https://ns.example.com");
        config.scheduler.sync_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_request_timeout_is_rejected() {
        let mut config = Config::for_url("https://ns.example.com");
        config.nightscout.request_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn ledger_config_carries_secret() {
        let mut config = Config::for_url("https://ns.example.com");
        assert_eq!(config.ledger().api_secret, None);

        config.nightscout.api_secret = Some("s3cret".into());
        let ledger = config.ledger();
        assert_eq!(ledger.base_url, "https://ns.example.com");
        assert_eq!(ledger.api_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn debug_redacts_secret() {
        let mut config = Config::for_url("https://ns.example.com");
        config.nightscout.api_secret = Some("s3cret".into());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn from_file_reads_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[nightscout]\nurl = \"https://ns.example.com/\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.nightscout.url, "https://ns.example.com");
    }

    #[test]
    fn from_file_missing_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn from_file_garbage_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is = = not toml").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
