use nestling_core::{BackendKind, RetryPolicy, WritePolicy, MAX_ACTIVE_SLEEP_DURATION_MINUTES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Backoff settings for commands that retry reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.initial_delay_ms))
    }
}

/// Write policy per record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WritePolicies {
    pub babies: WritePolicy,
    pub sleep: WritePolicy,
    pub questions: WritePolicy,
}

impl Default for WritePolicies {
    fn default() -> Self {
        Self {
            babies: WritePolicy::Active,
            sleep: WritePolicy::Active,
            questions: WritePolicy::Dual {
                primary: BackendKind::Relational,
            },
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Directory holding the Automerge documents
    pub documents_dir: ConfigValue<PathBuf>,
    /// User that owns new records
    pub user_id: ConfigValue<String>,
    /// Backend that reads go to
    pub active_backend: ConfigValue<BackendKind>,
    /// Running sleep entries older than this are closed on read
    pub max_active_sleep_minutes: ConfigValue<i64>,
    pub retry: RetryConfig,
    pub write_policy: WritePolicies,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    documents_dir: Option<PathBuf>,
    user_id: Option<String>,
    active_backend: Option<BackendKind>,
    max_active_sleep_minutes: Option<i64>,
    retry: Option<RetryConfig>,
    write_policy: Option<WritePolicies>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let data_dir = Self::default_data_dir();

        let mut database_path =
            ConfigValue::new(data_dir.join("nestling.db"), ConfigSource::Default);
        let mut documents_dir = ConfigValue::new(data_dir.join("documents"), ConfigSource::Default);
        let mut user_id = ConfigValue::new("default".to_string(), ConfigSource::Default);
        let mut active_backend = ConfigValue::new(BackendKind::default(), ConfigSource::Default);
        let mut max_active_sleep_minutes =
            ConfigValue::new(MAX_ACTIVE_SLEEP_DURATION_MINUTES, ConfigSource::Default);
        let mut retry = RetryConfig::default();
        let mut write_policy = WritePolicies::default();
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                database_path = ConfigValue::new(resolve(&path, db_path), ConfigSource::File);
            }
            if let Some(dir) = file_config.documents_dir {
                documents_dir = ConfigValue::new(resolve(&path, dir), ConfigSource::File);
            }
            if let Some(user) = file_config.user_id {
                user_id = ConfigValue::new(user, ConfigSource::File);
            }
            if let Some(backend) = file_config.active_backend {
                active_backend = ConfigValue::new(backend, ConfigSource::File);
            }
            if let Some(minutes) = file_config.max_active_sleep_minutes {
                if minutes <= 0 {
                    return Err(ConfigError::InvalidValue(
                        "max_active_sleep_minutes".to_string(),
                        format!("must be positive, got {}", minutes),
                    ));
                }
                max_active_sleep_minutes = ConfigValue::new(minutes, ConfigSource::File);
            }
            if let Some(retry_config) = file_config.retry {
                retry = retry_config;
            }
            if let Some(policies) = file_config.write_policy {
                write_policy = policies;
            }
        }

        // Apply environment variable overrides
        if let Ok(db_path) = std::env::var("NESTLING_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("NESTLING_DOCUMENTS_DIR") {
            documents_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(user) = std::env::var("NESTLING_USER_ID") {
            user_id = ConfigValue::new(user, ConfigSource::Environment);
        }
        if let Ok(backend) = std::env::var("NESTLING_BACKEND") {
            let backend = backend
                .parse::<BackendKind>()
                .map_err(|e| ConfigError::InvalidValue("NESTLING_BACKEND".to_string(), e))?;
            active_backend = ConfigValue::new(backend, ConfigSource::Environment);
        }

        Ok(Self {
            database_path,
            documents_dir,
            user_id,
            active_backend,
            max_active_sleep_minutes,
            retry,
            write_policy,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/nestling/
    /// - macOS: ~/Library/Application Support/nestling/
    /// - Windows: %APPDATA%/nestling/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nestling")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/nestling/
    /// - macOS: ~/Library/Application Support/nestling/
    /// - Windows: %APPDATA%/nestling/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nestling")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

/// Relative paths in the config file are relative to the file's directory.
fn resolve(config_path: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        config_path
            .parent()
            .map(|p| p.join(&path))
            .unwrap_or(path)
    } else {
        path
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, e) => {
                write!(f, "Invalid value for '{}': {}", key, e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
