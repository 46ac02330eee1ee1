//! The persisted system configuration (`system_config.json`).
//!
//! Written once after a model is chosen; read by the chat surfaces at
//! startup to pick the model and its generation parameters.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::defaults::{self, GenerationDefaults};
use crate::hardware::HardwareProfile;

pub const DEFAULT_CONFIG_FILE: &str = "system_config.json";

/// Model used when no configuration has been written yet.
pub const FALLBACK_MODEL: &str = "codellama:7b";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("{path} is not a valid system configuration: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize system configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl RecommendedSettings {
    pub fn for_model(model: &str) -> Self {
        Self::with_defaults(model, defaults::defaults_for(model))
    }

    pub fn with_defaults(model: &str, defaults: GenerationDefaults) -> Self {
        Self {
            model: model.to_string(),
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
        }
    }

    pub fn generation_defaults(&self) -> GenerationDefaults {
        GenerationDefaults {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

impl Default for RecommendedSettings {
    fn default() -> Self {
        Self::with_defaults(FALLBACK_MODEL, GenerationDefaults::CONSERVATIVE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SystemConfig {
    #[serde(default)]
    pub system_analysis: HardwareProfile,
    #[serde(default)]
    pub recommended_settings: RecommendedSettings,
}

impl SystemConfig {
    pub fn from_selection(profile: HardwareProfile, model: &str) -> Self {
        Self {
            system_analysis: profile,
            recommended_settings: RecommendedSettings::for_model(model),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like `load`, but a missing file yields the built-in fallback.
    /// A file that exists but cannot be parsed is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no system configuration yet, using fallback");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Write pretty JSON via a sibling temp file so readers never see a
    /// half-written file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json + "\n").map_err(write_err)?;
        fs::rename(&tmp, path).map_err(write_err)?;

        info!(
            path = %path.display(),
            model = %self.recommended_settings.model,
            "saved system configuration"
        );
        Ok(())
    }
}
