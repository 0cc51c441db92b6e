//! Static asset server
//!
//! Serves files from an asset root over HTTP/1.1 with single-page
//! application fallback, per-extension `Cache-Control`, and one JSON access
//! record per request.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use error::{Result, ServerError};
