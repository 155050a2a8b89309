use serde::Deserialize;

/// Logging settings; `RUST_LOG` takes precedence over `level` when set
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub log_to_file: bool,
    #[serde(default)]
    pub log_file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
            log_file_path: String::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
