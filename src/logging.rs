//! Logging System
//!
//! Structured logging built on the `tracing` crate. Diagnostics go to stderr
//! so generated Markdown on stdout stays clean; a file destination is
//! available for long incremental runs.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stderr, file, file+stderr
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output includes file
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format, stderr only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, Error> {
    if let Ok(env_directive) = std::env::var("MDFOLD_LOG") {
        if !env_directive.is_empty() {
            return EnvFilter::try_new(&env_directive)
                .map_err(|e| Error::Config(format!("Invalid MDFOLD_LOG directive: {}", e)));
        }
    }
    let mut directive = config.level.clone();
    for (module, level) in &config.modules {
        directive.push_str(&format!(",{}={}", module, level));
    }
    EnvFilter::try_new(&directive)
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", config.level, e)))
}

fn open_log_file(config: &LoggingConfig) -> Result<std::fs::File, Error> {
    let path = config
        .file
        .clone()
        .unwrap_or_else(|| PathBuf::from("mdfold.log"));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create log directory: {}", e)))?;
        }
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| Error::Config(format!("Failed to open log file {:?}: {}", path, e)))
}

/// Initialize the logging system
///
/// Priority order (highest to lowest):
/// 1. MDFOLD_LOG environment variable
/// 2. Configuration file
/// 3. Defaults
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), Error> {
    let default_config = LoggingConfig::default();
    let config = config.unwrap_or(&default_config);

    if !config.enabled {
        Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(std::io::sink))
            .init();
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let base_subscriber = Registry::default().with(filter);
    let to_file = config.output.contains("file");
    let to_stderr = config.output.contains("stderr") || !to_file;

    if config.format == "json" {
        if to_file && to_stderr {
            let writer = open_log_file(config)?.and(std::io::stderr);
            base_subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(writer),
                )
                .init();
        } else if to_file {
            base_subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(open_log_file(config)?),
                )
                .init();
        } else {
            base_subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    } else if to_file && to_stderr {
        let writer = open_log_file(config)?.and(std::io::stderr);
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init();
    } else if to_file {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(open_log_file(config)?),
            )
            .init();
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.color)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}
