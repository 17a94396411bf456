//! Configuration for gaze-scanpath.

use crate::core::fixation::{FixationParams, DEFAULT_FIXATION_THRESHOLD};
use crate::core::overlay::OverlayMode;
use crate::core::scanpath::{ScanpathParams, DEFAULT_ANNOTATION_MIN_DURATION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest stimulus width or height that is still rendered.
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 65536;

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dispersion threshold for fixation detection (stimulus pixels)
    pub fixation_threshold: f64,

    /// Fixations longer than this (ms) get an index label
    pub annotation_min_duration_ms: i64,

    /// Folder created inside each layer directory for overlays
    pub plots_folder: String,

    /// Stimuli wider or taller than this are skipped
    pub max_image_dimension: u32,

    /// Overlay modes rendered per stimulus
    pub modes: Vec<OverlayMode>,

    /// Path for storing processing statistics
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gaze-scanpath");

        Self {
            fixation_threshold: DEFAULT_FIXATION_THRESHOLD,
            annotation_min_duration_ms: DEFAULT_ANNOTATION_MIN_DURATION,
            plots_folder: "plots".to_string(),
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
            modes: vec![OverlayMode::ScanpathMouse],
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file, falling back to defaults if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gaze-scanpath")
            .join("config.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Check that the values can drive a render.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fixation_params()?;
        if self.plots_folder.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "plots_folder must not be empty".to_string(),
            ));
        }
        if self.modes.is_empty() {
            return Err(ConfigError::InvalidValue(
                "at least one overlay mode is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fixation_params(&self) -> Result<FixationParams, ConfigError> {
        FixationParams::new(self.fixation_threshold)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    pub fn scanpath_params(&self) -> ScanpathParams {
        ScanpathParams {
            annotation_min_duration: self.annotation_min_duration_ms,
        }
    }

    /// Path of the persisted processing statistics.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("stats.json")
    }
}

/// Parse overlay modes from a comma-separated string.
///
/// `all` selects every mode. Duplicates are dropped, first occurrence wins.
pub fn modes_from_csv(s: &str) -> Result<Vec<OverlayMode>, ConfigError> {
    let mut modes = Vec::new();
    for part in s.split(',').map(|p| p.trim()).filter(|p| !p.is_empty()) {
        let parsed = if part.eq_ignore_ascii_case("all") {
            OverlayMode::ALL.to_vec()
        } else {
            vec![part.parse::<OverlayMode>().map_err(ConfigError::InvalidValue)?]
        };
        for mode in parsed {
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
    }
    Ok(modes)
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
