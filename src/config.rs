//! TOML configuration: version mapping rules and node roles
//!
//! The raw table is kept so that each loader can tell an absent key apart
//! from a malformed one.

use crate::mapping::{self, MappingError, VersionMapping};
use crate::roles::{self, RoleConfigError, RoleTable};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration path, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "cfg/config.toml";

/// Configuration embedded at build time for zero-config operation
const DEFAULT_CONFIG: &str = include_str!("../cfg/config.toml");

/// Errors that can occur while reading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Loaded configuration document
#[derive(Debug, Clone, Default)]
pub struct Config {
    table: toml::Table,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content, path)?;

        tracing::debug!(path = %path.display(), keys = config.table.len(), "loaded config");
        Ok(config)
    }

    /// Configuration shipped with the binary (`cfg/config.toml`)
    pub fn default_config() -> Result<Self, ConfigError> {
        Self::parse(DEFAULT_CONFIG, Path::new(DEFAULT_CONFIG_PATH))
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let table = content
            .parse::<toml::Table>()
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { table })
    }

    /// Ordered kubernetes → benchmark rules
    pub fn version_mapping(&self) -> Result<VersionMapping, MappingError> {
        mapping::load_version_mapping(&self.table)
    }

    /// Node roles and their required components
    pub fn roles(&self) -> Result<RoleTable, RoleConfigError> {
        roles::load_roles(&self.table)
    }
}
