use dimse::{DimseConfig, DimseError};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{CommitmentConfig, LoggingConfig, TargetConfig};

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid [dimse] section: {0}")]
    Dimse(#[from] DimseError),

    #[error("invalid [commitment] section: {0}")]
    InvalidCommitment(String),

    #[error("invalid target '{ae_title}': {reason}")]
    InvalidTarget { ae_title: String, reason: String },

    #[error("target '{0}' is configured more than once")]
    DuplicateTarget(String),
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dimse: DimseConfig,
    #[serde(default)]
    pub commitment: CommitmentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl Config {
    /// Load and validate a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML configuration document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dimse.validate()?;
        self.commitment.validate()?;

        let mut seen = HashSet::new();
        for target in &self.targets {
            target.node.validate().map_err(|e| ConfigError::InvalidTarget {
                ae_title: target.node.ae_title.clone(),
                reason: e.to_string(),
            })?;
            if target.role_reversal_wait_secs == 0 {
                return Err(ConfigError::InvalidTarget {
                    ae_title: target.node.ae_title.clone(),
                    reason: "role_reversal_wait_secs must be greater than 0".to_string(),
                });
            }
            if target.callback_port == Some(0) {
                return Err(ConfigError::InvalidTarget {
                    ae_title: target.node.ae_title.clone(),
                    reason: "callback_port must be greater than 0".to_string(),
                });
            }
            if !seen.insert(target.node.ae_title.as_str()) {
                return Err(ConfigError::DuplicateTarget(target.node.ae_title.clone()));
            }
        }

        Ok(())
    }

    /// Look up a configured target by AE title
    pub fn target(&self, ae_title: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|t| t.node.ae_title == ae_title)
    }
}
