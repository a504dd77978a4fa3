//! Configuration file handling

use luaspoof_format::{CompressOptions, DecompressOptions};
use luaspoof_format::engine::{DEFAULT_CHUNK_SIZE, DEFAULT_DICT_SIZE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
    #[error("Configuration file '{}' not found", path.display())]
    NotFound { path: PathBuf },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings shared by every command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SpoofConfig {
    /// LZMA dictionary size in bytes
    pub dict_size: u32,
    /// Read size in bytes
    pub chunk_size: usize,
    /// Suffix of uncompressed sources, after the CRC digits
    pub source_suffix: String,
    /// Suffix of containers, after the CRC digits
    pub output_suffix: String,
    /// Whether decompression replaces sources that already exist
    pub overwrite_existing: bool,
}

impl Default for SpoofConfig {
    fn default() -> Self {
        Self {
            dict_size: DEFAULT_DICT_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            source_suffix: ".src.lua".to_string(),
            output_suffix: ".lua".to_string(),
            overwrite_existing: false,
        }
    }
}

impl SpoofConfig {
    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("luaspoof").join("luaspoof.toml"))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one the default location is used
    /// if present, and built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No configuration file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!("Loading configuration from {}", path.display());
        Self::from_toml_str(&fs::read_to_string(&path)?)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the settings make sense together
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_suffix.is_empty() || self.output_suffix.is_empty() {
            return Err(ConfigError::Invalid(
                "source_suffix and output_suffix must not be empty".to_string(),
            ));
        }

        // Matching is anchored at the start only, so a suffix that begins with
        // the other one would map some names onto themselves
        if self.source_suffix.starts_with(&self.output_suffix)
            || self.output_suffix.starts_with(&self.source_suffix)
        {
            return Err(ConfigError::Invalid(format!(
                "source_suffix '{}' and output_suffix '{}' overlap",
                self.source_suffix, self.output_suffix
            )));
        }

        self.compress_options()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn compress_options(&self) -> CompressOptions {
        CompressOptions {
            dict_size: self.dict_size,
            chunk_size: self.chunk_size,
        }
    }

    pub fn decompress_options(&self) -> DecompressOptions {
        DecompressOptions {
            chunk_size: self.chunk_size,
        }
    }
}
