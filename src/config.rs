/*!
 * Configuration support for the RevPulse library
 *
 * Provides runtime configuration options for customizing loading, export,
 * and reporting behavior. Algorithm constants (factor weights, ramp
 * parameters, tier cut points) are deliberately not configurable; they live
 * as named constants next to the engines that use them.
 */

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants::{ASSUMED_CHRONIC_PREVALENCE, DEFAULT_DISTINCT_CODES};

/// Global configuration for the RevPulse library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevPulseConfig {
    /// Whether to show progress bars during long operations
    #[serde(default = "default_enable_progress_bar")]
    pub enable_progress_bar: bool,

    /// Number of threads for parallel operations (None = use all available)
    #[serde(default)]
    pub parallel_threads: Option<usize>,

    /// Whether to validate CSV headers against the expected schema
    #[serde(default = "default_validate_headers")]
    pub validate_headers: bool,

    /// Whether to skip invalid records during parsing
    #[serde(default)]
    pub skip_invalid_records: bool,

    /// Default export format
    #[serde(default)]
    pub default_export_format: crate::ExportFormat,

    /// Distinct-code count assumed when an extract carries no code-level data
    #[serde(default = "default_distinct_codes")]
    pub default_distinct_codes: u32,

    /// Chronic-condition prevalence assumed when a benchmark omits it
    #[serde(default = "default_chronic_prevalence")]
    pub assumed_chronic_prevalence: f64,
}

impl Default for RevPulseConfig {
    fn default() -> Self {
        Self {
            enable_progress_bar: default_enable_progress_bar(),
            parallel_threads: None,
            validate_headers: default_validate_headers(),
            skip_invalid_records: false,
            default_export_format: crate::ExportFormat::Json,
            default_distinct_codes: default_distinct_codes(),
            assumed_chronic_prevalence: default_chronic_prevalence(),
        }
    }
}

// Default value functions for serde
fn default_enable_progress_bar() -> bool {
    true
}

fn default_validate_headers() -> bool {
    true
}

fn default_distinct_codes() -> u32 {
    DEFAULT_DISTINCT_CODES
}

fn default_chronic_prevalence() -> f64 {
    ASSUMED_CHRONIC_PREVALENCE
}

impl RevPulseConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `REVPULSE_PROGRESS_BAR`: "true" or "false"
    /// - `REVPULSE_PARALLEL_THREADS`: number or "auto"
    /// - `REVPULSE_VALIDATE_HEADERS`: "true" or "false"
    /// - `REVPULSE_SKIP_INVALID`: "true" or "false"
    /// - `REVPULSE_DISTINCT_CODES`: number
    /// - `REVPULSE_CHRONIC_PREVALENCE`: fraction between 0 and 1
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("REVPULSE_PROGRESS_BAR") {
            config.enable_progress_bar = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("REVPULSE_PARALLEL_THREADS") {
            config.parallel_threads = match val.to_lowercase().as_str() {
                "auto" | "0" => None,
                num => num.parse().ok(),
            };
        }

        if let Ok(val) = std::env::var("REVPULSE_VALIDATE_HEADERS") {
            config.validate_headers = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("REVPULSE_SKIP_INVALID") {
            config.skip_invalid_records = val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("REVPULSE_DISTINCT_CODES") {
            if let Ok(codes) = val.parse() {
                config.default_distinct_codes = codes;
            }
        }

        if let Ok(val) = std::env::var("REVPULSE_CHRONIC_PREVALENCE") {
            if let Ok(prevalence) = val.parse::<f64>() {
                if (0.0..=1.0).contains(&prevalence) {
                    config.assumed_chronic_prevalence = prevalence;
                }
            }
        }

        config
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| crate::RevPulseError::Configuration {
                message: format!("Failed to parse config file: {}", e),
                suggestion: Some("Check that the file is valid TOML format".to_string()),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::RevPulseError::Configuration {
                message: format!("Failed to serialize config: {}", e),
                suggestion: None,
            })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/revpulse/config.toml` on Unix-like systems
    /// or `%APPDATA%\revpulse\config.toml` on Windows
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "revpulse")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location, environment, or defaults
    ///
    /// Priority order:
    /// 1. Default config file (if exists)
    /// 2. Environment variables
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_config_path() {
            if config_path.exists() {
                if let Ok(config) = Self::from_file(&config_path) {
                    return config;
                }
            }
        }

        Self::from_env()
    }

    /// Create a configuration optimized for bulk scans
    pub fn performance() -> Self {
        Self {
            enable_progress_bar: false,
            parallel_threads: None, // Use all available
            validate_headers: false,
            skip_invalid_records: true,
            default_export_format: crate::ExportFormat::JsonLines,
            default_distinct_codes: default_distinct_codes(),
            assumed_chronic_prevalence: default_chronic_prevalence(),
        }
    }

    /// Create a configuration optimized for strict validation
    pub fn safe() -> Self {
        Self {
            enable_progress_bar: true,
            parallel_threads: Some(1), // Single-threaded for predictability
            validate_headers: true,
            skip_invalid_records: false,
            default_export_format: crate::ExportFormat::Json,
            default_distinct_codes: default_distinct_codes(),
            assumed_chronic_prevalence: default_chronic_prevalence(),
        }
    }
}

// Global configuration support
use std::sync::RwLock;

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: RwLock<Option<RevPulseConfig>> = RwLock::new(None);
}

/// Set the global configuration
pub fn set_global_config(config: RevPulseConfig) {
    *GLOBAL_CONFIG.write().unwrap() = Some(config);
}

/// Get the global configuration (or default if not set)
pub fn global_config() -> RevPulseConfig {
    GLOBAL_CONFIG.read().unwrap()
        .as_ref()
        .cloned()
        .unwrap_or_else(RevPulseConfig::load)
}

/// Clear the global configuration
pub fn clear_global_config() {
    *GLOBAL_CONFIG.write().unwrap() = None;
}

/// Builder for customizing configuration
pub struct ConfigBuilder {
    config: RevPulseConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self {
            config: RevPulseConfig::default(),
        }
    }

    /// Set progress bar enabled
    pub fn progress_bar(mut self, enabled: bool) -> Self {
        self.config.enable_progress_bar = enabled;
        self
    }

    /// Set number of parallel threads
    pub fn parallel_threads(mut self, threads: Option<usize>) -> Self {
        self.config.parallel_threads = threads;
        self
    }

    /// Set header validation
    pub fn validate_headers(mut self, validate: bool) -> Self {
        self.config.validate_headers = validate;
        self
    }

    /// Set skip invalid records
    pub fn skip_invalid_records(mut self, skip: bool) -> Self {
        self.config.skip_invalid_records = skip;
        self
    }

    /// Set the default export format
    pub fn default_export_format(mut self, format: crate::ExportFormat) -> Self {
        self.config.default_export_format = format;
        self
    }

    /// Set the assumed distinct-code count
    pub fn default_distinct_codes(mut self, codes: u32) -> Self {
        self.config.default_distinct_codes = codes;
        self
    }

    /// Set the assumed chronic prevalence
    pub fn assumed_chronic_prevalence(mut self, prevalence: f64) -> Self {
        self.config.assumed_chronic_prevalence = prevalence;
        self
    }

    /// Build the configuration
    pub fn build(self) -> RevPulseConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RevPulseConfig::default();
        assert!(config.enable_progress_bar);
        assert!(config.validate_headers);
        assert_eq!(config.default_distinct_codes, DEFAULT_DISTINCT_CODES);
        assert_eq!(config.assumed_chronic_prevalence, ASSUMED_CHRONIC_PREVALENCE);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .progress_bar(false)
            .parallel_threads(Some(4))
            .validate_headers(false)
            .skip_invalid_records(true)
            .default_distinct_codes(12)
            .build();

        assert!(!config.enable_progress_bar);
        assert_eq!(config.parallel_threads, Some(4));
        assert!(!config.validate_headers);
        assert!(config.skip_invalid_records);
        assert_eq!(config.default_distinct_codes, 12);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = ConfigBuilder::new()
            .progress_bar(false)
            .assumed_chronic_prevalence(0.4)
            .build();
        config.save(&path).unwrap();

        let loaded = RevPulseConfig::from_file(&path).unwrap();
        assert!(!loaded.enable_progress_bar);
        assert_eq!(loaded.assumed_chronic_prevalence, 0.4);
    }
}
