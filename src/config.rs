//! Environment configuration for the host binaries
//!
//! Reads:
//!   LOG_LEVEL      - TRACE, DEBUG, INFO (default), WARN/WARNING, ERROR/CRITICAL, OFF
//!   TVM_OPERATION  - pins the Lambda host to a single operation (e.g. `fv`, `xirr`)
//!
//! The calculation modules never read configuration.

use std::env;
use std::str::FromStr;

use log::LevelFilter;
use thiserror::Error;

use crate::operation::Operation;

pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";
pub const OPERATION_VAR: &str = "TVM_OPERATION";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Invalid TVM_OPERATION: {0}")]
    InvalidOperation(String),
}

/// Settings shared by the binaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub log_level: LevelFilter,
    /// When set, incoming events are bare argument objects for this operation
    pub operation: Option<Operation>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL,
            operation: None,
        }
    }
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level = match lookup(LOG_LEVEL_VAR) {
            Some(level) => parse_log_level(&level)?,
            None => DEFAULT_LOG_LEVEL,
        };

        let operation = match lookup(OPERATION_VAR) {
            Some(name) if !name.trim().is_empty() => Some(
                name.trim()
                    .parse::<Operation>()
                    .map_err(|_| ConfigError::InvalidOperation(name.clone()))?,
            ),
            _ => None,
        };

        Ok(Self {
            log_level,
            operation,
        })
    }

    /// Install the global logger at the configured level.
    ///
    /// `RUST_LOG`, when set, still takes precedence for per-module filters.
    pub fn init_logging(&self) {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(self.log_level).parse_default_env();
        // Ignore a second initialisation (tests, repeated host start-up)
        let _ = builder.try_init();
    }
}

/// Parse a log level name, also accepting `WARNING` and `CRITICAL`
pub fn parse_log_level(level: &str) -> Result<LevelFilter, ConfigError> {
    match level.trim().to_ascii_uppercase().as_str() {
        "WARNING" => Ok(LevelFilter::Warn),
        "CRITICAL" => Ok(LevelFilter::Error),
        other => LevelFilter::from_str(other)
            .map_err(|_| ConfigError::InvalidLogLevel(level.to_string())),
    }
}
