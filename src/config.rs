//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub import: ImportConfig,
}

/// Graph store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which backend to use.
    pub backend: StoreBackendType,
    /// Base URL of the remote store.
    pub url: String,
    /// API key, if the store requires one. Falls back to the
    /// TRELLIS_STORE_API_KEY environment variable.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Base used when rendering reference beacons.
    pub beacon_base: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendType::Http,
            url: "http://localhost:8080".to_string(),
            api_key: None,
            timeout_secs: 30,
            beacon_base: "weaviate://localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendType {
    Http,
    Memory,
}

/// Import run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Path to the newline-delimited input file.
    pub input: String,
    /// Whether writes are batched per line or sent immediately.
    pub write_mode: WriteMode,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            input: "transcripts-meta.json".to_string(),
            write_mode: WriteMode::Batched,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Batched,
    Immediate,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the first file found in standard locations,
    /// or defaults when none exists.
    pub fn load() -> Result<Self, ConfigError> {
        let candidates = Self::candidate_paths();
        for path in &candidates {
            if path.exists() {
                info!("Loading config from {}", path.display());
                return Self::from_file(path);
            }
        }
        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml"), PathBuf::from("trellis.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("trellis").join("config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".trellis").join("config.toml"));
        }
        paths
    }

    /// Validate settings that would otherwise fail deep inside a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.url.is_empty() {
            return Err(ConfigError::MissingField("store.url".to_string()));
        }
        if self.store.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "store.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.import.input.is_empty() {
            return Err(ConfigError::MissingField("import.input".to_string()));
        }
        Ok(())
    }

    /// Input path with `~` expanded.
    pub fn input_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.import.input).into_owned())
    }
}
