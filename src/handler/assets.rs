//! Asset resolution and serving
//!
//! Maps a request path to a file under the asset root, falls back to the
//! index document for unknown paths, and answers with the file, a
//! conditional 304, or a byte range.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use hyper::body::Bytes;
use hyper::Method;
use tokio::fs;

use super::RequestContext;
use crate::config::{AssetsConfig, FallbackPolicy};
use crate::http::{self, cache, mime, FileHeaders, HttpResponse, RangeParseResult};
use crate::logger::Logger;

/// Outcome of mapping a request path onto the asset root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    File(PathBuf),
    NotFound,
    /// Undecodable path or one escaping the root
    BadRequest,
}

/// Resolve a URL path to the file that should be served
pub async fn resolve(assets: &AssetsConfig, url_path: &str) -> Resolution {
    let Some(name) = candidate_name(url_path, &assets.index_file) else {
        return Resolution::BadRequest;
    };

    if let Some(path) = existing_file(&assets.root.join(name), &assets.index_file).await {
        return Resolution::File(path);
    }

    match assets.fallback {
        FallbackPolicy::Index => {
            let index = assets.root.join(&assets.index_file);
            if is_file(&index).await {
                Resolution::File(index)
            } else {
                Resolution::NotFound
            }
        }
        FallbackPolicy::NotFound => Resolution::NotFound,
    }
}

/// Relative file name for a URL path, `None` if it must be rejected
fn candidate_name(url_path: &str, index_file: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url_path).ok()?;
    let trimmed = decoded.strip_prefix('/').unwrap_or(&decoded[..]);

    let mut name = PathBuf::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['\\', '\0']) => return None,
            s => name.push(s),
        }
    }

    if name.as_os_str().is_empty() {
        name.push(index_file);
    }
    Some(name)
}

/// The file itself, or the index document inside a directory
async fn existing_file(path: &Path, index_file: &str) -> Option<PathBuf> {
    let metadata = fs::metadata(path).await.ok()?;
    if metadata.is_file() {
        return Some(path.to_path_buf());
    }
    if metadata.is_dir() {
        let index = path.join(index_file);
        if is_file(&index).await {
            return Some(index);
        }
    }
    None
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

/// Serve the asset for this request
pub async fn serve(ctx: &RequestContext, assets: &AssetsConfig, logger: &Logger) -> HttpResponse {
    let path = match resolve(assets, &ctx.path).await {
        Resolution::File(path) => path,
        Resolution::NotFound => return http::build_404_response(),
        Resolution::BadRequest => {
            logger.debug(&format!("Rejected request path: {}", ctx.path));
            return http::build_400_response();
        }
    };

    let (data, modified) = match read_asset(&path).await {
        Ok(asset) => asset,
        // Removed between resolution and read
        Err(e) if e.kind() == io::ErrorKind::NotFound => return http::build_404_response(),
        Err(e) => {
            logger.error(&format!("Failed to read file '{}': {e}", path.display()));
            return http::build_500_response();
        }
    };

    let headers = FileHeaders {
        content_type: mime::content_type_for(&path, &data),
        etag: cache::generate_etag(&data),
        last_modified: modified.map(cache::format_http_date),
        cache_control: cache::CachePolicy::for_path(&path).map(cache::CachePolicy::to_header_value),
    };

    let response = if is_not_modified(ctx, &headers.etag, modified) {
        http::build_304_response(&headers)
    } else {
        match http::parse_range_header(ctx.range.as_deref(), data.len()) {
            RangeParseResult::Satisfiable(range) => {
                http::build_partial_response(&data, range, &headers, ctx.is_head())
            }
            RangeParseResult::Unsatisfiable => return http::build_416_response(data.len()),
            RangeParseResult::Ignored => http::build_file_response(data, &headers, ctx.is_head()),
        }
    };

    response.unwrap_or_else(|e| {
        logger.error(&format!("Failed to build response for '{}': {e}", path.display()));
        http::build_500_response()
    })
}

/// `If-None-Match` wins over `If-Modified-Since`; only GET and HEAD are conditional
fn is_not_modified(ctx: &RequestContext, etag: &str, modified: Option<SystemTime>) -> bool {
    if ctx.method != Method::GET && ctx.method != Method::HEAD {
        return false;
    }
    if ctx.if_none_match.is_some() {
        return cache::check_etag_match(ctx.if_none_match.as_deref(), etag);
    }
    modified.is_some_and(|m| cache::not_modified_since(ctx.if_modified_since.as_deref(), m))
}

async fn read_asset(path: &Path) -> io::Result<(Bytes, Option<SystemTime>)> {
    let data = fs::read(path).await?;
    let modified = fs::metadata(path).await?.modified().ok();
    Ok((Bytes::from(data), modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use crate::logger::testing::memory_logger;
    use http_body_util::BodyExt;
    use hyper::header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, LAST_MODIFIED};
    use hyper::StatusCode;
    use tempfile::TempDir;

    fn asset_tree() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::write(root.join("app.js"), "console.log(1)").unwrap();
        std::fs::write(root.join("data.json"), "{\"rows\":3}").unwrap();
        std::fs::create_dir(root.join("docs")).unwrap();
        std::fs::write(root.join("docs").join("index.html"), "<h1>docs</h1>").unwrap();
        std::fs::create_dir(root.join("empty")).unwrap();
        dir
    }

    fn ctx(path: &str) -> RequestContext {
        RequestContext {
            method: Method::GET,
            path: path.to_string(),
            if_none_match: None,
            if_modified_since: None,
            range: None,
        }
    }

    async fn body_of(response: HttpResponse) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[test]
    fn test_candidate_name() {
        let name = |p: &str| candidate_name(p, "index.html");
        assert_eq!(name("/"), Some(PathBuf::from("index.html")));
        assert_eq!(name(""), Some(PathBuf::from("index.html")));
        assert_eq!(name("/app.js"), Some(PathBuf::from("app.js")));
        assert_eq!(name("/img//logo.svg"), Some(PathBuf::from("img/logo.svg")));
        assert_eq!(name("/my%20file.txt"), Some(PathBuf::from("my file.txt")));
        assert_eq!(name("/../etc/passwd"), None);
        assert_eq!(name("/a/%2e%2e/b"), None);
        assert_eq!(name("/a%5c..%5cb"), None);
        assert_eq!(name("/%ff"), None);
    }

    #[tokio::test]
    async fn test_resolve_with_index_fallback() {
        let dir = asset_tree();
        let assets = AssetsConfig::new(dir.path(), FallbackPolicy::Index);
        let root = dir.path();

        assert_eq!(resolve(&assets, "/").await, Resolution::File(root.join("index.html")));
        assert_eq!(resolve(&assets, "/app.js").await, Resolution::File(root.join("app.js")));
        assert_eq!(
            resolve(&assets, "/docs/").await,
            Resolution::File(root.join("docs").join("index.html"))
        );
        assert_eq!(
            resolve(&assets, "/dashboard/settings").await,
            Resolution::File(root.join("index.html"))
        );
        assert_eq!(
            resolve(&assets, "/empty").await,
            Resolution::File(root.join("index.html"))
        );
        assert_eq!(resolve(&assets, "/../secret").await, Resolution::BadRequest);
    }

    #[tokio::test]
    async fn test_resolve_without_fallback() {
        let dir = asset_tree();
        let assets = AssetsConfig::new(dir.path(), FallbackPolicy::NotFound);

        assert_eq!(resolve(&assets, "/missing-file.xyz").await, Resolution::NotFound);
        assert_eq!(resolve(&assets, "/empty").await, Resolution::NotFound);
        assert_eq!(
            resolve(&assets, "/app.js").await,
            Resolution::File(dir.path().join("app.js"))
        );
    }

    #[tokio::test]
    async fn test_resolve_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetsConfig::new(dir.path(), FallbackPolicy::Index);
        assert_eq!(resolve(&assets, "/").await, Resolution::NotFound);
        assert_eq!(resolve(&assets, "/anything").await, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_serve_file_with_cache_policy() {
        let dir = asset_tree();
        let assets = AssetsConfig::new(dir.path(), FallbackPolicy::Index);
        let (logger, _, _) = memory_logger(LogLevel::Info);

        let response = serve(&ctx("/app.js"), &assets, &logger).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CACHE_CONTROL],
            "public, max-age=31536000, immutable"
        );
        assert!(response.headers().contains_key(ETAG));
        assert!(response.headers().contains_key(LAST_MODIFIED));
        assert_eq!(body_of(response).await, Bytes::from_static(b"console.log(1)"));

        let response = serve(&ctx("/data.json"), &assets, &logger).await;
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=60");
    }

    #[tokio::test]
    async fn test_fallback_classified_after_resolution() {
        let dir = asset_tree();
        let assets = AssetsConfig::new(dir.path(), FallbackPolicy::Index);
        let (logger, _, _) = memory_logger(LogLevel::Info);

        // A missing .js path serves index.html, which carries no cache header
        let response = serve(&ctx("/chunk-404.js"), &assets, &logger).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CACHE_CONTROL).is_none());
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body_of(response).await, Bytes::from_static(b"<h1>home</h1>"));
    }

    #[tokio::test]
    async fn test_serve_not_found_and_bad_request() {
        let dir = asset_tree();
        let assets = AssetsConfig::new(dir.path(), FallbackPolicy::NotFound);
        let (logger, _, _) = memory_logger(LogLevel::Info);

        let response = serve(&ctx("/missing-file.xyz"), &assets, &logger).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = serve(&ctx("/../Cargo.toml"), &assets, &logger).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_conditional_requests() {
        let dir = asset_tree();
        let assets = AssetsConfig::new(dir.path(), FallbackPolicy::Index);
        let (logger, _, _) = memory_logger(LogLevel::Info);

        let first = serve(&ctx("/app.js"), &assets, &logger).await;
        let etag = first.headers()[ETAG].to_str().unwrap().to_string();
        let last_modified = first.headers()[LAST_MODIFIED].to_str().unwrap().to_string();

        let mut by_etag = ctx("/app.js");
        by_etag.if_none_match = Some(etag);
        let response = serve(&by_etag, &assets, &logger).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(
            response.headers()[CACHE_CONTROL],
            "public, max-age=31536000, immutable"
        );
        assert!(body_of(response).await.is_empty());

        let mut by_date = ctx("/app.js");
        by_date.if_modified_since = Some(last_modified.clone());
        let response = serve(&by_date, &assets, &logger).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        // A stale ETag overrides a matching date
        let mut stale = ctx("/app.js");
        stale.if_none_match = Some("\"stale\"".to_string());
        stale.if_modified_since = Some(last_modified);
        let response = serve(&stale, &assets, &logger).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_range_and_head() {
        let dir = asset_tree();
        let assets = AssetsConfig::new(dir.path(), FallbackPolicy::Index);
        let (logger, _, _) = memory_logger(LogLevel::Info);

        let mut ranged = ctx("/app.js");
        ranged.range = Some("bytes=0-6".to_string());
        let response = serve(&ranged, &assets, &logger).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(body_of(response).await, Bytes::from_static(b"console"));

        ranged.range = Some("bytes=500-".to_string());
        let response = serve(&ranged, &assets, &logger).await;
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);

        let mut head = ctx("/app.js");
        head.method = Method::HEAD;
        let response = serve(&head, &assets, &logger).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-length"], "14");
        assert!(body_of(response).await.is_empty());
    }
}
