use crate::output::OutputFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MIN_MULTIPLIER: u32 = 1;
pub const MAX_MULTIPLIER: u32 = 20;

/// Configuration errors. All of them abort a run before any payload is read.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML from config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Multiplier must be an integer between 1 and 20, got: {0}")]
    MultiplierOutOfRange(u32),

    #[error("Retry factor must be at least 1, got: {0}")]
    InvalidRetryFactor(u32),

    #[error("Technique allow-list is empty")]
    EmptyTechniqueList,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct EngineSettings {
    /// Variants wanted per payload, the preserved original included.
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
    /// Allow-list of technique names. `None` selects every registered technique.
    #[serde(default)]
    pub techniques: Option<Vec<String>>,
    #[serde(default)]
    pub preserve_original: bool,
    /// The retry phase makes at most `retry_factor * multiplier` technique invocations.
    #[serde(default = "default_retry_factor")]
    pub retry_factor: u32,
    /// Fixed seed for reproducible output. A random seed is drawn when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub verbose: bool,
}

pub fn default_multiplier() -> u32 {
    5
}

pub fn default_retry_factor() -> u32 {
    3
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_MULTIPLIER..=MAX_MULTIPLIER).contains(&self.multiplier) {
            return Err(ConfigError::MultiplierOutOfRange(self.multiplier));
        }
        if self.retry_factor == 0 {
            return Err(ConfigError::InvalidRetryFactor(self.retry_factor));
        }
        if self.techniques.as_ref().is_some_and(|names| names.is_empty()) {
            return Err(ConfigError::EmptyTechniqueList);
        }
        Ok(())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            multiplier: default_multiplier(),
            techniques: None,
            preserve_original: false,
            retry_factor: default_retry_factor(),
            seed: None,
            verbose: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
    /// Destination file. Standard output when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct ShapeshiftConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

impl ShapeshiftConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ShapeshiftConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(config)
    }
}
