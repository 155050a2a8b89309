pub mod commitment;
pub mod config;
pub mod error;
pub mod models;

use anyhow::Context;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::LoggingConfig;

pub use crate::commitment::{join_all, CommitmentManager, ProtocolOutcome, WorkerHandle};
pub use crate::config::{Config, ConfigError};
pub use crate::error::CommitError;
pub use crate::models::{
    CommitOutcome, CommitStrategy, CommitSummary, FileOutcome, RequestDescriptor, TargetResult,
};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level. Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("invalid log level '{}'", config.level))?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true);

    let file_layer = if config.log_to_file {
        let file = std::fs::File::create(&config.log_file_path)
            .with_context(|| format!("cannot create log file '{}'", config.log_file_path))?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::sync::Mutex::new(file)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("failed to initialize logging")?;

    tracing::info!("Storage commitment logging initialised at '{}'", config.level);
    Ok(())
}
