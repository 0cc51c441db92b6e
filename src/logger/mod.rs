//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Access logging as newline-delimited JSON
//! - Server lifecycle, warning and error messages
//! - The access log middleware wrapping request handlers
//!
//! A `Logger` is built once at startup and handed to whatever needs it;
//! there is no process-global logger.

mod format;
pub mod middleware;
pub mod writer;

pub use format::{round_to_micros, AccessLogEntry, CLIENT_IP_HEADER, COUNTRY_HEADER};
pub use middleware::{AccessLog, ABANDONED_STATUS};
pub use writer::LogWriter;

use crate::config::{Config, LogLevel, LoggingConfig};
use std::net::SocketAddr;

/// Access and diagnostic log sinks
///
/// Access records go to stdout (or the configured file) and nothing else
/// does, so that stream stays machine-readable. Diagnostic messages go to
/// stderr, filtered by level.
#[derive(Debug)]
pub struct Logger {
    level: LogLevel,
    access: LogWriter,
    diagnostic: LogWriter,
}

impl Logger {
    pub const fn new(level: LogLevel, access: LogWriter, diagnostic: LogWriter) -> Self {
        Self {
            level,
            access,
            diagnostic,
        }
    }

    /// Build the logger described by the configuration
    pub fn from_config(config: &LoggingConfig) -> std::io::Result<Self> {
        let access = match config.access_log_file {
            Some(ref path) => LogWriter::file(path)?,
            None => LogWriter::stdout(),
        };
        Ok(Self::new(config.level, access, LogWriter::stderr()))
    }

    /// Write one access record
    pub fn access(&self, entry: &AccessLogEntry) {
        match entry.to_json() {
            Ok(line) => self.access.write_line(&line),
            Err(e) => self.error(&format!("Failed to encode access log entry: {e}")),
        }
    }

    pub fn debug(&self, message: &str) {
        self.diagnostic(LogLevel::Debug, "[DEBUG]", message);
    }

    pub fn info(&self, message: &str) {
        self.diagnostic(LogLevel::Info, "[INFO]", message);
    }

    pub fn warn(&self, message: &str) {
        self.diagnostic(LogLevel::Warn, "[WARN]", message);
    }

    pub fn error(&self, message: &str) {
        self.diagnostic(LogLevel::Error, "[ERROR]", message);
    }

    fn diagnostic(&self, level: LogLevel, tag: &str, message: &str) {
        if level >= self.level {
            self.diagnostic.write_line(&format!("{tag} {message}"));
        }
    }

    pub fn server_started(&self, addr: &SocketAddr, config: &Config) {
        self.info("======================================");
        self.info("Asset server started successfully");
        self.info(&format!("Listening on: http://{addr}"));
        self.info(&format!("Asset root: {}", config.assets.root.display()));
        self.info(&format!("Missing files: {:?}", config.assets.fallback));
        self.info(&format!("Log level: {}", config.logging.level));
        if let Some(workers) = config.server.workers {
            self.info(&format!("Worker threads: {workers}"));
        }
        if let Some(ref path) = config.logging.access_log_file {
            self.info(&format!("Access log: {path}"));
        }
        self.info("======================================");
    }

    pub fn connection_error(&self, peer_addr: &SocketAddr, err: &impl std::fmt::Display) {
        self.debug(&format!("Connection from {peer_addr} ended with error: {err}"));
    }
}
