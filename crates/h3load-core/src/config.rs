//! Loader configuration that callers build once and pass down explicitly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Verbosity recognized by the binary layer when it installs a subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(Error::Config(format!("unknown log level '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory holding dataset files and the metadata catalog.
    pub database_dir: String,

    pub log_level: LogLevel,

    /// Grid resolution used when a pipeline description aggregates but does
    /// not name one.
    pub default_resolution: Option<u8>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            database_dir: "./h3load-data".to_string(),
            log_level: LogLevel::Info,
            default_resolution: None,
        }
    }
}

impl LoaderConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `H3LOAD_DATABASE_DIR`: store directory
    /// - `H3LOAD_LOG_LEVEL`: one of error/warn/info/debug/trace
    /// - `H3LOAD_DEFAULT_RESOLUTION`: grid resolution (0-15)
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(s) = lookup("H3LOAD_DATABASE_DIR") {
            if !s.trim().is_empty() {
                cfg.database_dir = s;
            }
        }

        if let Some(s) = lookup("H3LOAD_LOG_LEVEL") {
            if let Ok(v) = s.parse::<LogLevel>() {
                cfg.log_level = v;
            }
        }

        if let Some(s) = lookup("H3LOAD_DEFAULT_RESOLUTION") {
            if let Ok(v) = s.trim().parse::<u8>() {
                cfg.default_resolution = Some(v);
            }
        }

        cfg
    }
}
