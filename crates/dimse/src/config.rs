//! Configuration types for DIMSE associations

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::DEFAULT_DIMSE_PORT;

/// Local DIMSE settings shared by every association this node takes part in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimseConfig {
    /// Local Application Entity Title
    pub local_aet: String,

    /// Port on which remote nodes deliver asynchronous commitment results
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on opening an association
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Upper bound on one inbound result exchange, from accept to release
    #[serde(default = "default_association_timeout")]
    pub association_timeout_ms: u64,
}

/// Configuration for a remote DICOM node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNode {
    /// Remote Application Entity Title
    pub ae_title: String,

    /// Remote host address
    pub host: String,

    /// Remote port
    pub port: u16,
}

impl Default for DimseConfig {
    fn default() -> Self {
        Self {
            local_aet: "COMMIT_SCU".to_string(),
            port: default_port(),
            connect_timeout_ms: default_connect_timeout(),
            association_timeout_ms: default_association_timeout(),
        }
    }
}

impl DimseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Get association timeout as Duration
    pub fn association_timeout(&self) -> Duration {
        Duration::from_millis(self.association_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        validate_ae_title(&self.local_aet, "Local")?;

        if self.port == 0 {
            return Err(crate::error::DimseError::config(
                "Port must be greater than 0"
            ));
        }

        if self.connect_timeout_ms == 0 || self.association_timeout_ms == 0 {
            return Err(crate::error::DimseError::config(
                "Connect and association timeouts must be greater than 0"
            ));
        }

        Ok(())
    }
}

impl RemoteNode {
    /// Create a new remote node configuration
    pub fn new(ae_title: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            ae_title: ae_title.into(),
            host: host.into(),
            port,
        }
    }

    /// Validate the remote node configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        validate_ae_title(&self.ae_title, "Remote")?;

        if self.host.is_empty() {
            return Err(crate::error::DimseError::config(
                "Remote host cannot be empty"
            ));
        }

        if self.port == 0 {
            return Err(crate::error::DimseError::config(
                "Remote port must be greater than 0"
            ));
        }

        Ok(())
    }
}

impl std::fmt::Display for RemoteNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.ae_title, self.host, self.port)
    }
}

fn validate_ae_title(ae_title: &str, which: &str) -> crate::error::Result<()> {
    if ae_title.trim().is_empty() || ae_title.len() > 16 {
        return Err(crate::error::DimseError::InvalidAeTitle(format!(
            "{} AE title must be 1-16 characters: '{}'",
            which, ae_title
        )));
    }
    if ae_title.contains('\\') || ae_title.chars().any(|c| c.is_control()) {
        return Err(crate::error::DimseError::InvalidAeTitle(format!(
            "{} AE title contains forbidden characters: '{}'",
            which, ae_title
        )));
    }
    Ok(())
}

// Default value functions
fn default_port() -> u16 {
    DEFAULT_DIMSE_PORT
}

fn default_connect_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_association_timeout() -> u64 {
    300_000 // 5 minutes
}
