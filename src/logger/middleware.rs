//! Access log middleware
//!
//! `AccessLog` wraps any `hyper` service and emits exactly one access record
//! per request. Request and response pass through untouched. A request whose
//! future is dropped before the inner service answers is still recorded.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use hyper::service::Service;
use hyper::{Request, Response, StatusCode};

use super::{AccessLogEntry, Logger};

/// Service wrapper recording status and latency of the inner service
#[derive(Debug, Clone)]
pub struct AccessLog<S> {
    inner: S,
    logger: Arc<Logger>,
}

impl<S> AccessLog<S> {
    pub const fn new(inner: S, logger: Arc<Logger>) -> Self {
        Self { inner, logger }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AccessLog<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<ReqBody>) -> Self::Future {
        let entry = AccessLogEntry::from_request(&req);
        let record = PendingRecord::new(entry, Arc::clone(&self.logger));
        let response = self.inner.call(req);

        Box::pin(async move {
            let result = response.await;
            // A response always carries a status (200 unless the handler set one);
            // a failed handler is reported the way hyper answers it.
            let status = match result {
                Ok(ref res) => res.status(),
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            record.complete(status.as_u16());
            result
        })
    }
}

/// Status recorded when the request future is dropped before a response exists,
/// e.g. the client went away mid-request
pub const ABANDONED_STATUS: u16 = 499;

/// Access record of one in-flight request
///
/// Written exactly once: by `complete`, or on drop with `ABANDONED_STATUS`.
struct PendingRecord {
    entry: Option<AccessLogEntry>,
    start: Instant,
    logger: Arc<Logger>,
}

impl PendingRecord {
    fn new(entry: AccessLogEntry, logger: Arc<Logger>) -> Self {
        Self {
            entry: Some(entry),
            start: Instant::now(),
            logger,
        }
    }

    fn complete(mut self, status: u16) {
        self.write(status);
    }

    fn write(&mut self, status: u16) {
        if let Some(entry) = self.entry.take() {
            self.logger.access(&entry.finish(status, self.start.elapsed()));
        }
    }
}

impl Drop for PendingRecord {
    fn drop(&mut self) {
        self.write(ABANDONED_STATUS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use crate::logger::testing::memory_logger;
    use http_body_util::{Empty, Full};
    use hyper::body::Bytes;
    use hyper::service::service_fn;
    use serde_json::Value;
    use std::convert::Infallible;
    use std::time::Duration;

    fn request(path: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .method("GET")
            .uri(path)
            .header("CF-Connecting-IP", "198.51.100.4")
            .header("CF-IPCountry", "DE")
            .body(Empty::new())
            .unwrap()
    }

    fn records(lines: &[String]) -> Vec<Value> {
        lines
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_default_status_logged_as_200() {
        let (logger, access, _) = memory_logger(LogLevel::Info);
        let service = AccessLog::new(
            service_fn(|_req: Request<Empty<Bytes>>| async {
                Ok::<_, Infallible>(Response::new(Full::new(Bytes::from_static(b"hello"))))
            }),
            Arc::new(logger),
        );

        let response = service.call(request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let records = records(&access.lines());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["status"], 200);
        assert_eq!(records[0]["method"], "GET");
        assert_eq!(records[0]["path"], "/");
        assert_eq!(records[0]["ip"], "198.51.100.4");
        assert_eq!(records[0]["country"], "DE");
    }

    #[tokio::test]
    async fn test_explicit_status_is_recorded() {
        let (logger, access, _) = memory_logger(LogLevel::Info);
        let service = AccessLog::new(
            service_fn(|_req: Request<Empty<Bytes>>| async {
                let mut response = Response::new(Full::new(Bytes::new()));
                *response.status_mut() = StatusCode::NOT_FOUND;
                Ok::<_, Infallible>(response)
            }),
            Arc::new(logger),
        );

        let response = service.call(request("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(records(&access.lines())[0]["status"], 404);
    }

    #[tokio::test]
    async fn test_response_passes_through_unchanged() {
        let (logger, _, _) = memory_logger(LogLevel::Info);
        let service = AccessLog::new(
            service_fn(|_req: Request<Empty<Bytes>>| async {
                Response::builder()
                    .status(StatusCode::CREATED)
                    .header("x-asset", "yes")
                    .body(Full::new(Bytes::from_static(b"made")))
            }),
            Arc::new(logger),
        );

        let response = service.call(request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-asset"], "yes");
    }

    #[tokio::test]
    async fn test_failed_handler_logged_as_500() {
        let (logger, access, _) = memory_logger(LogLevel::Info);
        let service = AccessLog::new(
            service_fn(|_req: Request<Empty<Bytes>>| async {
                Err::<Response<Full<Bytes>>, _>(std::io::Error::other("disk gone"))
            }),
            Arc::new(logger),
        );

        assert!(service.call(request("/")).await.is_err());
        assert_eq!(records(&access.lines())[0]["status"], 500);
    }

    #[tokio::test]
    async fn test_one_record_per_request_with_latency() {
        let (logger, access, _) = memory_logger(LogLevel::Info);
        let service = AccessLog::new(
            service_fn(|_req: Request<Empty<Bytes>>| async {
                tokio::time::sleep(Duration::from_millis(2)).await;
                Ok::<_, Infallible>(Response::new(Full::new(Bytes::new())))
            }),
            Arc::new(logger),
        );

        for path in ["/a", "/b", "/c"] {
            service.call(request(path)).await.unwrap();
        }

        let records = records(&access.lines());
        assert_eq!(records.len(), 3);
        for (record, path) in records.iter().zip(["/a", "/b", "/c"]) {
            assert_eq!(record["path"], path);
            let latency = record["latency"].as_u64().unwrap();
            assert!(latency >= 2_000_000, "latency {latency}");
            assert_eq!(latency % 1_000, 0);
        }
    }

    #[tokio::test]
    async fn test_dropped_request_still_logged() {
        let (logger, access, _) = memory_logger(LogLevel::Info);
        let service = AccessLog::new(
            service_fn(|_req: Request<Empty<Bytes>>| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, Infallible>(Response::new(Full::new(Bytes::new())))
            }),
            Arc::new(logger),
        );

        let outcome =
            tokio::time::timeout(Duration::from_millis(20), service.call(request("/slow"))).await;
        assert!(outcome.is_err());

        let records = records(&access.lines());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["path"], "/slow");
        assert_eq!(records[0]["status"], ABANDONED_STATUS);
        assert!(records[0]["latency"].as_u64().unwrap() >= 10_000_000);
    }

    #[tokio::test]
    async fn test_completed_request_logged_once() {
        let (logger, access, _) = memory_logger(LogLevel::Info);
        let service = AccessLog::new(
            service_fn(|_req: Request<Empty<Bytes>>| async {
                Ok::<_, Infallible>(Response::new(Full::new(Bytes::new())))
            }),
            Arc::new(logger),
        );

        let response = service.call(request("/")).await.unwrap();
        drop(response);

        assert_eq!(access.lines().len(), 1);
        assert_eq!(records(&access.lines())[0]["status"], 200);
    }
}
