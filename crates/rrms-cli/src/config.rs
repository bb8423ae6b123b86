//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Command-line arguments, applied by the command handlers

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use rrms_schemas::validation::{ValidationConfig, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Validation settings
    pub validation: ValidationSettings,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Validation settings, mirrored onto [`ValidationConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Similarity cutoff for field name suggestions
    pub similarity_cutoff: f64,

    /// Maximum expression nesting, 0 for unlimited
    pub max_depth: usize,

    /// Keys accepted and dropped on any model
    pub passthrough_fields: Vec<String>,

    /// Stop at the first invalid file
    pub fail_fast: bool,

    /// Stop once this many files are invalid, 0 for unlimited
    pub max_errors: usize,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: OutputFormat,

    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators
    pub progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level used when no `-v` flag is given (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (compact, full, json)
    pub format: String,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        let defaults = ValidationConfig::default();
        Self {
            similarity_cutoff: defaults.similarity_cutoff,
            max_depth: DEFAULT_MAX_DEPTH,
            passthrough_fields: defaults.passthrough_fields,
            fail_fast: defaults.fail_fast,
            max_errors: defaults.max_errors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Human,
            color: true,
            progress: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl ValidationSettings {
    /// Library configuration for these settings
    pub fn to_validation_config(&self) -> ValidationConfig {
        let mut config = ValidationConfig::default()
            .with_similarity_cutoff(self.similarity_cutoff)
            .with_passthrough_fields(self.passthrough_fields.iter().cloned())
            .with_max_errors(self.max_errors);
        config = match self.max_depth {
            0 => config.unlimited_depth(),
            depth => config.with_max_depth(depth),
        };
        if self.fail_fast {
            config = config.with_fail_fast();
        }
        config
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "Loaded configuration");
                        return Ok(config);
                    }
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        // Return default config if no config file found
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// Project configuration file written by `config init`
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".rrms.yaml")
    }

    /// User configuration file written by `config init --user`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rrms").join("config.yaml"))
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            Self::project_config_path(),
            PathBuf::from(".rrms.json"),
            PathBuf::from("rrms.yaml"),
            PathBuf::from("rrms.json"),
        ];

        // User config directory
        if let Some(config_dir) = dirs::config_dir() {
            let rrms_dir = config_dir.join("rrms");
            paths.push(rrms_dir.join("config.yaml"));
            paths.push(rrms_dir.join("config.json"));
        }

        // Home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".rrms.yaml"));
            paths.push(home_dir.join(".rrms.json"));
        }

        paths
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_library() {
        let config = Config::default();
        assert_eq!(config.validation.to_validation_config(), ValidationConfig::default());
        assert_eq!(config.output.format, OutputFormat::Human);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_zero_depth_is_unlimited() {
        let settings = ValidationSettings {
            max_depth: 0,
            fail_fast: true,
            ..ValidationSettings::default()
        };
        let config = settings.to_validation_config();
        assert_eq!(config.max_depth, None);
        assert!(config.fail_fast);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str(
            "validation:\n  similarity_cutoff: 0.9\noutput:\n  format: json-pretty\n",
        )
        .unwrap();
        assert_eq!(config.validation.similarity_cutoff, 0.9);
        assert_eq!(config.validation.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.output.format, OutputFormat::JsonPretty);
        assert!(config.output.color);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.validation.passthrough_fields = vec!["ui_hint".to_string()];
        config.save(&path).unwrap();

        assert_eq!(Config::load_with_file(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_missing_config_file() {
        let error = Config::from_file(Path::new("/nonexistent/rrms.yaml")).unwrap_err();
        assert!(matches!(error, Error::FileNotFound { .. }));
    }
}
