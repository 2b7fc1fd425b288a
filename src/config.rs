//! Configuration for dof

use crate::error::{DofError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default dataset (backing) directory
pub fn default_dataset_dir() -> PathBuf {
    PathBuf::from("./dataset")
}

/// Default location of the config file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dof")
        .join("config.toml")
}

/// Compression used for payload members when packing an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl Compression {
    pub(crate) fn method(self) -> zip::CompressionMethod {
        match self {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the exploded dataset
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: PathBuf,

    /// Extract members only temporarily instead of into `dataset_dir`.
    /// Only `false` is supported.
    #[serde(default)]
    pub use_compressed: bool,

    /// Compression for payload members
    #[serde(default)]
    pub compression: Compression,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_dir: default_dataset_dir(),
            use_compressed: false,
            compression: Compression::default(),
        }
    }
}

impl Config {
    /// Config rooted at the given dataset directory
    pub fn with_dataset_dir<P: AsRef<Path>>(dataset_dir: P) -> Self {
        Self {
            dataset_dir: dataset_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| DofError::Config(format!("invalid config: {}", e)))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DofError::Config(format!("cannot serialize config: {}", e)))?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings that are accepted but not implemented
    pub fn validate(&self) -> Result<()> {
        if self.use_compressed {
            return Err(DofError::NotImplemented(
                "compressed (temporary extraction) use".to_string(),
            ));
        }
        Ok(())
    }
}
