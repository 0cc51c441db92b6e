//! HTTP cache control module
//!
//! Provides `ETag` generation, `Last-Modified` handling, conditional request
//! evaluation, and the per-extension `Cache-Control` policy.

use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::SystemTime;

const ONE_YEAR: u32 = 31_536_000;
const ONE_HOUR: u32 = 3600;
const ONE_MINUTE: u32 = 60;

/// IMF-fixdate, the only date format servers should emit
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Generate `ETag` using fast hashing
///
/// # Returns
/// Quoted `ETag` string, e.g., `"abc123def"`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports a single `ETag`, a comma separated list, weak validators
/// (`W/"abc"`, compared weakly) and the `*` wildcard.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
        })
    })
}

/// Format a timestamp as an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Check `If-Modified-Since` against the file's modification time.
///
/// Comparison is done at whole-second resolution because HTTP dates carry
/// no sub-second part. Unparseable dates never match.
pub fn not_modified_since(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = if_modified_since.and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
    else {
        return false;
    };
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}

/// Cache-Control policy assigned to a served file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Public cache with specified max-age (seconds)
    Public(u32),
    /// Public cache that never revalidates (fingerprinted bundles)
    Immutable(u32),
}

impl CachePolicy {
    /// Classify a file by its extension.
    ///
    /// Matching is case-sensitive; files with other extensions get no
    /// `Cache-Control` header at all.
    pub fn for_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("js" | "css") => Some(Self::Immutable(ONE_YEAR)),
            Some("png" | "svg") => Some(Self::Public(ONE_HOUR)),
            Some("json") => Some(Self::Public(ONE_MINUTE)),
            _ => None,
        }
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::Public(max_age) => format!("public, max-age={max_age}"),
            Self::Immutable(max_age) => format!("public, max-age={max_age}, immutable"),
        }
    }
}
