//! Access log format module
//!
//! One JSON object per request:
//! `{"level":"INFO","msg":"request","ip":"..","country":"..","method":"GET","path":"/","status":200,"latency":152000}`
//!
//! There is no timestamp field. `latency` is integer nanoseconds, rounded
//! to the nearest microsecond. `path` is percent-decoded, without the query.

use hyper::header::HeaderMap;
use hyper::Request;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Client address set by the upstream proxy
pub const CLIENT_IP_HEADER: &str = "cf-connecting-ip";
/// Client country code set by the upstream proxy
pub const COUNTRY_HEADER: &str = "cf-ipcountry";

/// Access log entry containing all request/response information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessLogEntry {
    /// Client IP as reported by the proxy, empty when absent
    pub ip: String,
    /// Client country code as reported by the proxy, empty when absent
    pub country: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    #[serde(serialize_with = "serialize_latency")]
    pub latency: Duration,
}

#[derive(Serialize)]
struct Record<'a> {
    level: &'static str,
    msg: &'static str,
    #[serde(flatten)]
    entry: &'a AccessLogEntry,
}

impl AccessLogEntry {
    /// Capture the request side of the entry; status and latency are filled by `finish`
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            ip: header_value(req.headers(), CLIENT_IP_HEADER),
            country: header_value(req.headers(), COUNTRY_HEADER),
            method: req.method().to_string(),
            path: decoded_path(req.uri().path()),
            status: 200,
            latency: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn finish(mut self, status: u16, elapsed: Duration) -> Self {
        self.status = status;
        self.latency = round_to_micros(elapsed);
        self
    }

    /// Serialize as a single-line JSON record
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&Record {
            level: "INFO",
            msg: "request",
            entry: self,
        })
    }
}

/// Round half away from zero to whole microseconds
pub fn round_to_micros(d: Duration) -> Duration {
    let micros = (d.as_nanos() + 500) / 1_000;
    Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
}

fn serialize_latency<S: Serializer>(latency: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX))
}

/// Percent-decoded request path; paths that do not decode to UTF-8 are kept as sent
fn decoded_path(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |p| p.into_owned())
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
