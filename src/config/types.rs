// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub assets: AssetsConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Asset serving configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AssetsConfig {
    /// Directory containing every servable file
    pub root: PathBuf,
    /// Document served for `/`, for directories, and as the fallback document
    pub index_file: String,
    pub fallback: FallbackPolicy,
}

impl AssetsConfig {
    pub fn new(root: impl Into<PathBuf>, fallback: FallbackPolicy) -> Self {
        Self {
            root: root.into(),
            index_file: "index.html".to_string(),
            fallback,
        }
    }
}

/// What happens when a request names a file that does not exist
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Serve the index document (single-page application routing)
    #[default]
    #[serde(rename = "index")]
    Index,
    /// Respond with 404 Not Found
    #[serde(rename = "none")]
    NotFound,
}

/// Performance configuration, timeouts in seconds (0 disables)
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub read_timeout: u64,
    pub write_timeout: u64,
}

impl PerformanceConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            read: non_zero_secs(self.read_timeout),
            write: non_zero_secs(self.write_timeout),
        }
    }
}

/// Resolved connection timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timeouts {
    /// Deadline for reading request headers
    pub read: Option<Duration>,
    /// Deadline for producing each response, counted from when the
    /// request reaches the handler
    pub write: Option<Duration>,
}

const fn non_zero_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level for diagnostic messages; access records are always written
    pub level: LogLevel,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
}

/// Diagnostic log level
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
