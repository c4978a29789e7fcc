//! Configuration management for imgpipe.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a missing file or a
//! partial file is always usable.

mod types;
mod validate;

pub use types::*;

use crate::error::{ConfigError, ImgpipeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for imgpipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pipeline wiring and admission settings
    pub pipeline: PipelineConfig,

    /// Resize stage settings
    pub resize: ResizeConfig,

    /// Save stage settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.imgpipe.imgpipe/config.toml
    /// - Linux: ~/.config/imgpipe/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\imgpipe\config\config.toml
    ///
    /// Falls back to ~/.imgpipe/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "imgpipe", "imgpipe")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".imgpipe").join("config.toml")
            })
    }

    /// Get the resolved output directory (with ~ expansion).
    ///
    /// The string form is kept as-is apart from the expansion, because
    /// destination paths are derived by prefix substitution on strings.
    pub fn output_dir(&self) -> String {
        shellexpand::tilde(&self.pipeline.output_dir).into_owned()
    }

    /// Write the default configuration to `path`, creating parent directories.
    ///
    /// An existing file is only replaced when `force` is set.
    pub fn write_default(path: &Path, force: bool) -> Result<(), ImgpipeError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()).into());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default().to_toml()?)?;
        Ok(())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.buffer_size, 1);
        assert_eq!(config.pipeline.input_root, "images/");
        assert_eq!(config.pipeline.accepted_extensions, vec!["jpg", "jpeg"]);
        assert_eq!(config.resize.width, 500);
        assert_eq!(config.output.jpeg_quality, 75);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[pipeline]"));
        assert!(toml.contains("[resize]"));
        assert!(toml.contains("[output]"));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[resize]\nwidth = 64\nfilter = \"nearest\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.resize.width, 64);
        assert_eq!(config.resize.height, 500);
        assert_eq!(config.resize.filter, ResizeFilter::Nearest);
        assert_eq!(config.pipeline.output_dir, "./images/output/");
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\njpeg_quality = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("jpeg_quality"));
    }

    #[test]
    fn test_output_dir_expands_tilde() {
        let mut config = Config::default();
        config.pipeline.output_dir = "~/out/".to_string();
        assert!(!config.output_dir().starts_with('~'));
        assert!(config.output_dir().ends_with("out/"));
    }

    #[test]
    fn test_write_default_is_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::write_default(&path, false).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.resize.width, 500);
        assert_eq!(config.output.jpeg_quality, 75);
    }

    #[test]
    fn test_write_default_needs_force_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        let err = Config::write_default(&path, false).unwrap_err();
        assert!(matches!(err, ImgpipeError::Config(ConfigError::AlreadyExists(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        Config::write_default(&path, true).unwrap();
        assert!(Config::load_from(&path).is_ok());
    }
}
