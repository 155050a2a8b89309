mod commitment_config;
mod logging_config;
mod target_config;
pub mod config;

pub use commitment_config::CommitmentConfig;
pub use config::{Config, ConfigError};
pub use logging_config::LoggingConfig;
pub use target_config::TargetConfig;
