//! User settings read from a JSON file.

use crate::graph::{DEFAULT_MAX_LANES, LaneConfig};
use crate::patch::DEFAULT_CONTEXT_LINES;
use error_set::error_set;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Commits between two progress reports of a graph walk.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 1000;

error_set! {
    /// Errors from reading the settings file
    ConfigError := {
        #[display("Failed to read settings from {path}: {message}")]
        Read { path: String, message: String },
        #[display("Invalid settings in {path}: {message}")]
        Invalid { path: String, message: String },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_max_lanes")]
    pub max_lanes: usize,
    #[serde(default)]
    pub force_rightmost: bool,
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

fn default_max_lanes() -> usize {
    DEFAULT_MAX_LANES
}

fn default_context_lines() -> usize {
    DEFAULT_CONTEXT_LINES
}

fn default_progress_interval() -> usize {
    DEFAULT_PROGRESS_INTERVAL
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_lanes: DEFAULT_MAX_LANES,
            force_rightmost: false,
            context_lines: DEFAULT_CONTEXT_LINES,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl Settings {
    fn config_dir() -> Option<PathBuf> {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(config).join("git-weave"));
        }
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config").join("git-weave"))
    }

    /// `settings.json` in the user's configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.json"))
    }

    /// Read settings from `path`. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let settings = serde_json::from_str(&data).map_err(|e| ConfigError::Invalid {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Read the default settings file, or fall back to defaults when there is
    /// none. A file that exists but can't be parsed is still an error.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn lane_config(&self) -> LaneConfig {
        LaneConfig {
            max_lanes: self.max_lanes,
            force_rightmost: self.force_rightmost,
        }
    }
}
