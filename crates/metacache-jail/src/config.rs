//! Named jail definitions loaded from TOML.
//!
//! # Example configuration
//!
//! ```toml
//! [jails.photos]
//! root = "photos/2023"
//!
//! [jails.shared]
//! root = "/shared/"
//! ```
//!
//! # Usage
//!
//! ```
//! use metacache_core::MemoryCache;
//! use metacache_jail::JailsConfig;
//! use std::sync::Arc;
//!
//! let config = JailsConfig::from_toml_str("[jails.photos]\nroot = \"photos/2023\"\n").unwrap();
//! let jail = config.jail("photos", Arc::new(MemoryCache::new(1))).unwrap();
//! assert_eq!(jail.root(), "photos/2023");
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use metacache_core::FileCache;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::jail::CacheJail;

/// Errors loading or using jail configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// The file that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for this schema.
    #[error("Invalid jail config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered back to TOML.
    #[error("Failed to serialize jail config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No jail with this name is configured.
    #[error("Unknown jail: {0}")]
    UnknownJail(String),
}

/// Configuration for one jail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct JailConfig {
    /// Root of the jail in the wrapped cache's namespace. Empty means
    /// no restriction.
    #[serde(default)]
    pub root: String,
}

impl JailConfig {
    /// Builds a jail over `cache` from this configuration.
    pub fn build<C: FileCache + ?Sized>(&self, cache: Arc<C>) -> CacheJail<C> {
        CacheJail::new(cache, &self.root)
    }
}

/// Set of named jails.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct JailsConfig {
    /// Jails keyed by name.
    #[serde(default)]
    pub jails: HashMap<String, JailConfig>,
}

impl JailsConfig {
    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            jails = config.jails.len(),
            "Loaded jail config"
        );
        Ok(config)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Builds the named jail over `cache`.
    pub fn jail<C: FileCache + ?Sized>(
        &self,
        name: &str,
        cache: Arc<C>,
    ) -> Result<CacheJail<C>, ConfigError> {
        self.jails
            .get(name)
            .map(|config| config.build(cache))
            .ok_or_else(|| ConfigError::UnknownJail(name.to_string()))
    }
}
