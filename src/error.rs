use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced to the code driving commitment workers
#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("commitment worker for {peer} terminated abnormally: {reason}")]
    WorkerAborted { peer: String, reason: String },
}
