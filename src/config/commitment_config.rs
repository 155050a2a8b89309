use serde::Deserialize;
use std::time::Duration;

use crate::config::ConfigError;
use crate::models::CommitStrategy;

/// Timing and identity settings for the commitment workflows
#[derive(Debug, Clone, Deserialize)]
pub struct CommitmentConfig {
    #[serde(default)]
    pub strategy: CommitStrategy,

    /// Wait per role-reversal listen attempt
    #[serde(default = "default_listen_timeout")]
    pub listen_timeout_secs: u64,

    /// Wait for the N-ACTION response
    #[serde(default = "default_ack_timeout")]
    pub ack_timeout_secs: u64,

    /// Pause after a rejected or aborted inbound connection
    #[serde(default = "default_reject_backoff")]
    pub reject_backoff_ms: u64,

    /// Upper bound on how long one worker waits for its results
    #[serde(default = "default_event_deadline")]
    pub event_deadline_secs: u64,

    /// Organisation root of generated transaction UIDs
    #[serde(default = "default_transaction_uid_root")]
    pub transaction_uid_root: String,

    #[serde(default = "default_device_type")]
    pub device_type: u16,

    #[serde(default = "default_device_serial")]
    pub device_serial: u32,
}

impl Default for CommitmentConfig {
    fn default() -> Self {
        Self {
            strategy: CommitStrategy::default(),
            listen_timeout_secs: default_listen_timeout(),
            ack_timeout_secs: default_ack_timeout(),
            reject_backoff_ms: default_reject_backoff(),
            event_deadline_secs: default_event_deadline(),
            transaction_uid_root: default_transaction_uid_root(),
            device_type: default_device_type(),
            device_serial: default_device_serial(),
        }
    }
}

impl CommitmentConfig {
    pub fn listen_timeout(&self) -> Duration {
        Duration::from_secs(self.listen_timeout_secs)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }

    pub fn reject_backoff(&self) -> Duration {
        Duration::from_millis(self.reject_backoff_ms)
    }

    pub fn event_deadline(&self) -> Duration {
        Duration::from_secs(self.event_deadline_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_timeout_secs == 0 {
            return Err(ConfigError::InvalidCommitment(
                "listen_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.ack_timeout_secs == 0 {
            return Err(ConfigError::InvalidCommitment(
                "ack_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.event_deadline_secs < self.listen_timeout_secs {
            return Err(ConfigError::InvalidCommitment(
                "event_deadline_secs must not be shorter than listen_timeout_secs".to_string(),
            ));
        }
        validate_uid_root(&self.transaction_uid_root)
    }
}

/// UID roots are dot-separated numbers without leading zeros
fn validate_uid_root(root: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| {
        Err(ConfigError::InvalidCommitment(format!(
            "transaction_uid_root '{}' {}",
            root, reason
        )))
    };

    if root.is_empty() || root.len() > 40 {
        return invalid("must be 1-40 characters");
    }
    for component in root.split('.') {
        if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
            return invalid("must consist of numeric components");
        }
        if component.len() > 1 && component.starts_with('0') {
            return invalid("must not contain components with leading zeros");
        }
    }
    Ok(())
}

fn default_listen_timeout() -> u64 {
    5
}

fn default_ack_timeout() -> u64 {
    300 // 5 minutes
}

fn default_reject_backoff() -> u64 {
    1_000
}

fn default_event_deadline() -> u64 {
    7 * 24 * 60 * 60 // one week
}

fn default_transaction_uid_root() -> String {
    "1.2.826.0.1.3680043.9.7133.1".to_string()
}

fn default_device_type() -> u16 {
    1
}

fn default_device_serial() -> u32 {
    1
}
