//! Configuration management for vbox-video.
//!
//! This module provides configuration loading and validation using figment,
//! layering an optional TOML file over built-in defaults. Command-line flags
//! override both.

use std::path::PathBuf;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::video::{VideoPattern, DEFAULT_EXTENSION};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name under the platform config directory.
const CONFIG_DIR_NAME: &str = "vbox-video";

/// What to do when the telemetry file already references a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingReference {
    /// Fail and leave the file untouched.
    #[default]
    Reject,
    /// Replace the existing reference.
    Overwrite,
}

impl std::fmt::Display for ExistingReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// Application configuration.
///
/// Loaded from (highest precedence first):
/// 1. TOML config file at `~/.config/vbox-video/config.toml`
/// 2. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Video naming configuration.
    pub video: VideoConfig,
    /// Reference insertion configuration.
    pub insert: InsertConfig,
}

/// Video naming configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Extension a candidate video must have, matched case-sensitively.
    pub extension: String,
}

/// Reference insertion configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertConfig {
    /// Position in the video, in seconds, where the log starts.
    pub offset_sec: f64,
    /// Policy for files that already reference a video.
    pub on_existing: ExistingReference,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or fails validation.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let extension = &self.video.extension;
        if extension.is_empty() {
            return Err(Error::config_validation("video.extension must not be empty"));
        }
        if !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::config_validation(format!(
                "video.extension must be ASCII letters and digits, got '{extension}'"
            )));
        }

        if !self.insert.offset_sec.is_finite() {
            return Err(Error::config_validation(
                "insert.offset_sec must be a finite number",
            ));
        }

        Ok(())
    }

    /// The video naming convention for the configured extension.
    #[must_use]
    pub fn video_pattern(&self) -> VideoPattern {
        VideoPattern::new(&self.video.extension)
    }
}
