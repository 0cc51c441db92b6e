//! HTTP response building module
//!
//! Builders for the responses the asset handler produces. Builders that take
//! dynamic header values return the `hyper` builder error so the caller can
//! report it; fixed-content builders cannot fail.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG,
    LAST_MODIFIED,
};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

use super::range::ByteRange;

pub type HttpResponse = Response<Full<Bytes>>;

/// Validators and policy headers shared by every response for one file
#[derive(Debug, Clone)]
pub struct FileHeaders {
    pub content_type: String,
    pub etag: String,
    pub last_modified: Option<String>,
    pub cache_control: Option<String>,
}

impl FileHeaders {
    fn apply(&self, mut builder: Builder) -> Builder {
        builder = builder.header(ETAG, &self.etag);
        if let Some(ref last_modified) = self.last_modified {
            builder = builder.header(LAST_MODIFIED, last_modified);
        }
        if let Some(ref cache_control) = self.cache_control {
            builder = builder.header(CACHE_CONTROL, cache_control);
        }
        builder
    }
}

/// Build 200 OK response carrying the whole file
pub fn build_file_response(
    data: Bytes,
    headers: &FileHeaders,
    is_head: bool,
) -> Result<HttpResponse, hyper::http::Error> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    headers
        .apply(Response::builder().status(StatusCode::OK))
        .header(CONTENT_TYPE, &headers.content_type)
        .header(CONTENT_LENGTH, content_length)
        .header(ACCEPT_RANGES, "bytes")
        .body(Full::new(body))
}

/// Build 206 Partial Content response for one byte range of the file
pub fn build_partial_response(
    data: &Bytes,
    range: ByteRange,
    headers: &FileHeaders,
    is_head: bool,
) -> Result<HttpResponse, hyper::http::Error> {
    let body = if is_head {
        Bytes::new()
    } else {
        data.slice(range.start..=range.end)
    };

    headers
        .apply(Response::builder().status(StatusCode::PARTIAL_CONTENT))
        .header(CONTENT_TYPE, &headers.content_type)
        .header(CONTENT_LENGTH, range.content_length())
        .header(CONTENT_RANGE, range.content_range(data.len()))
        .header(ACCEPT_RANGES, "bytes")
        .body(Full::new(body))
}

/// Build 304 Not Modified response
pub fn build_304_response(headers: &FileHeaders) -> Result<HttpResponse, hyper::http::Error> {
    headers
        .apply(Response::builder().status(StatusCode::NOT_MODIFIED))
        .body(Full::new(Bytes::new()))
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> HttpResponse {
    let mut response = plain_text(StatusCode::RANGE_NOT_SATISFIABLE, "416 Range Not Satisfiable");
    if let Ok(value) = format!("bytes */{file_size}").parse() {
        response.headers_mut().insert(CONTENT_RANGE, value);
    }
    response
}

/// Build 400 Bad Request response
pub fn build_400_response() -> HttpResponse {
    plain_text(StatusCode::BAD_REQUEST, "400 Bad Request")
}

/// Build 404 Not Found response
pub fn build_404_response() -> HttpResponse {
    plain_text(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> HttpResponse {
    plain_text(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// Build 503 Service Unavailable response, sent when a response misses its deadline
pub fn build_503_response() -> HttpResponse {
    plain_text(StatusCode::SERVICE_UNAVAILABLE, "503 Service Unavailable")
}

fn plain_text(status: StatusCode, message: &'static str) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from_static(message.as_bytes())));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(CONTENT_LENGTH, message.len().into());
    response
}
