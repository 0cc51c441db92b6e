// Configuration module entry point
// Loads the optional config file on top of built-in defaults

mod types;

use std::net::SocketAddr;

use crate::error::ServerError;

// Re-export public types
pub use types::{
    AssetsConfig, Config, FallbackPolicy, LogLevel, LoggingConfig, PerformanceConfig,
    ServerConfig, Timeouts,
};

/// Config file looked up in the working directory (any format the `config` crate knows)
pub const DEFAULT_CONFIG_NAME: &str = "assetd";

impl Config {
    /// Load configuration from `assetd.toml` in the working directory.
    /// A missing file leaves every setting at its default.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_NAME)
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 10003)?
            .set_default("assets.root", "assets")?
            .set_default("assets.index_file", "index.html")?
            .set_default("assets.fallback", "index")?
            .set_default("performance.read_timeout", 10)?
            .set_default("performance.write_timeout", 60)?
            .set_default("logging.level", "info")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ServerError::Address { addr, source })
    }
}
