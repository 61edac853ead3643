//! Configuration management

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::normalize_scheme;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Decryption pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecryptConfig {
    /// Treat modern-scheme candidates as gift-wrap capable even when unflagged
    pub infer_gift_wrap_from_scheme: bool,
    /// Scheme reported for a gift-wrap success when the candidate names none
    pub gift_wrap_scheme: String,
    /// Maximum cached successful results; 0 disables the cache
    pub cache_capacity: usize,
}

impl Default for DecryptConfig {
    fn default() -> Self {
        Self {
            infer_gift_wrap_from_scheme: true,
            gift_wrap_scheme: "nip44".to_string(),
            cache_capacity: 512,
        }
    }
}

impl DecryptConfig {
    /// Load configuration from environment variables and an optional TOML file
    pub fn load() -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Self::default();

        // Load from environment variables
        if let Ok(value) = std::env::var("DMX_INFER_GIFT_WRAP") {
            config.infer_gift_wrap_from_scheme = parse_bool(&value)
                .ok_or_else(|| ConfigError::Invalid(format!("Invalid DMX_INFER_GIFT_WRAP: {}", value)))?;
        }

        if let Ok(scheme) = std::env::var("DMX_GIFT_WRAP_SCHEME") {
            config.gift_wrap_scheme = scheme;
        }

        if let Ok(capacity) = std::env::var("DMX_CACHE_CAPACITY") {
            config.cache_capacity = capacity
                .trim()
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("Invalid DMX_CACHE_CAPACITY: {}", e)))?;
        }

        // Load from TOML config file (if specified)
        if let Ok(config_path) = std::env::var("DMX_CONFIG") {
            config = config.merge_toml_file(&config_path)?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document; missing keys take their default values
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scheme = normalize_scheme(&self.gift_wrap_scheme);
        if scheme.is_empty() {
            return Err(ConfigError::Invalid("gift_wrap_scheme must not be empty".to_string()));
        }
        if scheme != self.gift_wrap_scheme {
            return Err(ConfigError::Invalid(format!(
                "gift_wrap_scheme must be canonical: use {:?}",
                scheme
            )));
        }
        Ok(())
    }

    // Keys present in the file override what environment variables set.
    fn merge_toml_file(self, path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let table: toml::Value = toml::from_str(&content)?;
        let mut merged = self;

        if let Some(infer) = table.get("infer_gift_wrap_from_scheme").and_then(|v| v.as_bool()) {
            merged.infer_gift_wrap_from_scheme = infer;
        }

        if let Some(scheme) = table.get("gift_wrap_scheme").and_then(|v| v.as_str()) {
            merged.gift_wrap_scheme = scheme.to_string();
        }

        if let Some(capacity) = table.get("cache_capacity").and_then(|v| v.as_integer()) {
            merged.cache_capacity = usize::try_from(capacity)
                .map_err(|_| ConfigError::Invalid("cache_capacity must be >= 0".to_string()))?;
        }

        Ok(merged)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
