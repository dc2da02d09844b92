//! Sequence configuration and source loading
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables: `VOID_SEQUENCE_PATH`, `VOID_SEQUENCE_QUIET`
//! 2. Config file: `sequence.json` in the working directory
//! 3. Defaults
//!
//! # Example Config File
//!
//! ```json
//! { "base_path": "assets/sequences", "warn_missing_callbacks": true }
//! ```

use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SequenceError};
use crate::patch::{ScenePatcher, SceneScript};
use crate::scheduler::EventScheduler;
use crate::timeline::Timeline;

/// Default config file name
pub const CONFIG_FILE: &str = "sequence.json";

/// Sequence configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Base path that relative timeline and scene paths resolve against
    pub base_path: PathBuf,
    /// Report unregistered callback names at dispatch time
    pub warn_missing_callbacks: bool,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("sequences"),
            warn_missing_callbacks: true,
        }
    }
}

impl SequenceConfig {
    /// Load configuration from all sources
    pub fn load() -> Self {
        let mut config = match Self::load_from_file(CONFIG_FILE) {
            Ok(loaded) => {
                info!("Loaded sequence config from {}", CONFIG_FILE);
                loaded
            }
            Err(_) => Self::default(),
        };
        config.apply_env();
        config
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| SequenceError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Override fields from environment variables
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("VOID_SEQUENCE_PATH") {
            if !path.is_empty() {
                self.base_path = PathBuf::from(path);
                info!("Sequence base path from env: {}", self.base_path.display());
            }
        }

        if let Ok(quiet) = std::env::var("VOID_SEQUENCE_QUIET") {
            self.warn_missing_callbacks = !parse_flag(&quiet);
        }
    }

    /// Set base path
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = path.into();
        self
    }

    /// Resolve a path against the base path; absolute paths pass through
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Loads sequence sources relative to a configured base path
#[derive(Debug, Clone, Default)]
pub struct SequenceLoader {
    config: SequenceConfig,
}

impl SequenceLoader {
    pub fn new(config: SequenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Read a timeline
    pub fn timeline(&self, path: impl AsRef<Path>) -> Result<Timeline> {
        Timeline::from_path(self.config.resolve(path))
    }

    /// Read a scene script
    pub fn scene(&self, path: impl AsRef<Path>) -> Result<SceneScript> {
        SceneScript::from_path(self.config.resolve(path))
    }

    /// Build a configured scheduler with a timeline loaded
    pub fn scheduler(&self, path: impl AsRef<Path>) -> Result<EventScheduler> {
        let timeline = self.timeline(path)?;
        let mut scheduler = EventScheduler::with_config(&self.config);
        scheduler.load(&timeline)?;
        Ok(scheduler)
    }

    /// Build a patcher with a scene script loaded
    pub fn patcher(&self, path: impl AsRef<Path>) -> Result<ScenePatcher> {
        let script = self.scene(path)?;
        ScenePatcher::from_script(&script)
    }
}
