//! Portfolio configuration from portfolio.toml

use crate::dictionary::Dictionary;
use crate::export::ExportSettings;
use crate::outline::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up next to a portfolio
pub const CONFIG_FILE_NAME: &str = "portfolio.toml";

/// Deepest nesting level that can be configured
pub const MAX_CONFIGURABLE_DEPTH: usize = 9;

/// Main configuration from portfolio.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Deepest allowed chapter level (1..=9)
    pub max_depth: usize,

    /// Prefix of exported file names, followed by a millisecond timestamp
    pub filename_prefix: String,

    /// Export timing and image settings
    pub export: ExportConfig,

    /// Overrides for user-facing strings, keyed by dotted path
    pub strings: BTreeMap<String, String>,
}

/// `[export]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Pause before the first chapter is rendered
    pub start_delay_ms: u64,

    /// Pause after switching chapters so layout can settle
    pub settle_delay_ms: u64,

    /// Pause between capture attempts
    pub retry_delay_ms: u64,

    /// Capture attempts per region before the export fails
    pub max_attempts: u32,

    /// JPEG quality used when a capture is re-encoded
    pub image_quality: u8,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            filename_prefix: "H5P.Portfolio-Export".to_string(),
            export: ExportConfig::default(),
            strings: BTreeMap::new(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 100,
            settle_delay_ms: 500,
            retry_delay_ms: 2500,
            max_attempts: 3,
            image_quality: 90,
        }
    }
}

impl PortfolioConfig {
    /// Load configuration from a portfolio.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(PortfolioConfig)` - Successfully loaded and validated configuration
    /// * `Err(ConfigError)` - Error reading, parsing or validating the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(ConfigError::IoError)?;

        let config: PortfolioConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            log::info!(
                "No configuration at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// Save configuration to a portfolio.toml file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        fs::write(&path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CONFIGURABLE_DEPTH).contains(&self.max_depth) {
            return Err(ConfigError::InvalidValue(format!(
                "max_depth must be between 1 and {}, got {}",
                MAX_CONFIGURABLE_DEPTH, self.max_depth
            )));
        }
        if self.export.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "export.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.export.image_quality) {
            return Err(ConfigError::InvalidValue(format!(
                "export.image_quality must be between 1 and 100, got {}",
                self.export.image_quality
            )));
        }
        Ok(())
    }

    /// Dictionary with the configured string overrides applied
    pub fn dictionary(&self) -> Dictionary {
        let mut dictionary = Dictionary::new();
        dictionary.fill(self.strings.iter());
        dictionary
    }

    /// Timing and naming for the export pipeline
    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            start_delay: Duration::from_millis(self.export.start_delay_ms),
            settle_delay: Duration::from_millis(self.export.settle_delay_ms),
            retry_delay: Duration::from_millis(self.export.retry_delay_ms),
            max_attempts: self.export.max_attempts,
            filename_prefix: self.filename_prefix.clone(),
        }
    }
}

/// Errors that can occur when loading or saving the configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),

    /// A value is out of range
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
            ConfigError::InvalidValue(message) => write!(f, "Invalid configuration: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}
