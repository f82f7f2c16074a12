//! Service configuration
//!
//! Settings come from an optional YAML file; command-line flags override
//! whatever the file says.
//!
//! ```yaml
//! bind: 0.0.0.0:8081
//! markers: [remix, live, acoustic]
//! ```

use crate::grouping::{KeyDeriver, DEFAULT_MARKERS};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Port the service listens on when nothing else is configured
///
/// The default host is loopback; set `bind: 0.0.0.0:8081` to listen on
/// every interface.
pub const DEFAULT_PORT: u16 = 8081;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Socket address for the HTTP listener
    pub bind: SocketAddr,
    /// Variant markers stripped from titles when deriving keys
    pub markers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load settings from a YAML file; missing fields take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse settings from YAML text
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document parses as null rather than an empty mapping
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Override the bind address when one is given
    pub fn with_bind(mut self, bind: Option<SocketAddr>) -> Self {
        if let Some(bind) = bind {
            self.bind = bind;
        }
        self
    }

    /// Replace the marker list when the new one is non-empty
    pub fn with_markers(mut self, markers: Vec<String>) -> Self {
        if !markers.is_empty() {
            self.markers = markers;
        }
        self
    }

    /// Build a key deriver from the configured markers
    pub fn key_deriver(&self) -> KeyDeriver {
        KeyDeriver::with_markers(&self.markers)
    }
}
