//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub page: PageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Page defaults used by the CLI
#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    /// Directory relative page file paths are resolved against
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Size of newly created pages in bytes
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Capacity of the cursor results buffer for range queries
    #[serde(default = "default_results_capacity")]
    pub results_capacity: usize,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("tspage").to_string_lossy().to_string())
        .unwrap_or_else(|| "./tspage_data".to_string())
}

fn default_page_size() -> u64 {
    1024 * 1024 // 1 MB
}

fn default_results_capacity() -> usize {
    256
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            page_size: default_page_size(),
            results_capacity: default_results_capacity(),
        }
    }
}

impl PageConfig {
    /// Resolve a page file path against `data_dir`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.starts_with(".") {
            path.to_path_buf()
        } else {
            Path::new(&self.data_dir).join(path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("tspage").join("config.toml")),
            Some(PathBuf::from("/etc/tspage/config.toml")),
            Some(PathBuf::from("./tspage.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env().or_default()
    }

    /// Keep a valid config, otherwise log and fall back to the defaults
    fn or_default(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(e) => {
                tracing::warn!("Ignoring environment overrides: {}", e);
                Self::default()
            }
        }
    }

    /// Check values the page layer would reject later anyway
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = (crate::page::HEADER_SIZE
            + crate::page::INDEX_SLOT_SIZE
            + crate::page::ENTRY_HEADER_SIZE) as u64;
        if self.page.page_size < min || self.page.page_size > crate::page::MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "page_size must be between {} and {} bytes, got {}",
                min,
                crate::page::MAX_PAGE_SIZE,
                self.page.page_size
            )));
        }
        if self.page.results_capacity == 0 {
            return Err(ConfigError::Invalid(
                "results_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = std::env::var("TSPAGE_DATA_DIR") {
            self.page.data_dir = data_dir;
        }
        if let Ok(size) = std::env::var("TSPAGE_PAGE_SIZE") {
            if let Ok(s) = size.parse() {
                self.page.page_size = s;
            }
        }
        if let Ok(capacity) = std::env::var("TSPAGE_RESULTS_CAPACITY") {
            if let Ok(c) = capacity.parse() {
                self.page.results_capacity = c;
            }
        }

        if let Ok(level) = std::env::var("TSPAGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TSPAGE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# tspage Configuration
#
# Environment variables override these settings:
# - TSPAGE_DATA_DIR
# - TSPAGE_PAGE_SIZE
# - TSPAGE_RESULTS_CAPACITY
# - TSPAGE_LOG_LEVEL
# - TSPAGE_LOG_FORMAT

[page]
# Directory relative page file paths are resolved against
# (default: the platform data directory, e.g. ~/.local/share/tspage)
# data_dir = "/var/lib/tspage"

# Size of newly created pages (bytes, at most 4 GiB)
page_size = 1048576

# Number of entry indices fetched per range query batch
results_capacity = 256

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
