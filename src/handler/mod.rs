//! Request handler module
//!
//! A single catch-all route: every request, whatever its method, is
//! answered from the asset root.

pub mod assets;

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use hyper::service::Service;
use hyper::{Method, Request};

use crate::config::AssetsConfig;
use crate::http::{build_503_response, HttpResponse};
use crate::logger::Logger;

pub use assets::{resolve, Resolution};

/// Request context encapsulating information needed for request processing
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range: Option<String>,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            if_none_match: header("if-none-match"),
            if_modified_since: header("if-modified-since"),
            range: header("range"),
        }
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }
}

/// `hyper` service answering every request from the asset root
#[derive(Debug, Clone)]
pub struct AssetService {
    assets: Arc<AssetsConfig>,
    logger: Arc<Logger>,
    deadline: Option<Duration>,
}

impl AssetService {
    pub const fn new(assets: Arc<AssetsConfig>, logger: Arc<Logger>) -> Self {
        Self {
            assets,
            logger,
            deadline: None,
        }
    }

    /// Bound the time each request may take to produce its response
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

impl<B> Service<Request<B>> for AssetService {
    type Response = HttpResponse;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Infallible>> + Send>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let ctx = RequestContext::from_request(&req);
        let assets = Arc::clone(&self.assets);
        let logger = Arc::clone(&self.logger);
        let deadline = self.deadline;

        Box::pin(async move {
            let serving = assets::serve(&ctx, &assets, &logger);
            Ok(respond_within(deadline, serving, &ctx.path, &logger).await)
        })
    }
}

/// Await `response`, answering 503 if it is not ready before `deadline`
pub async fn respond_within<F>(
    deadline: Option<Duration>,
    response: F,
    path: &str,
    logger: &Logger,
) -> HttpResponse
where
    F: Future<Output = HttpResponse>,
{
    let Some(limit) = deadline else {
        return response.await;
    };

    match tokio::time::timeout(limit, response).await {
        Ok(response) => response,
        Err(_) => {
            logger.warn(&format!(
                "Response for {path} not ready within {}ms",
                limit.as_millis()
            ));
            build_503_response()
        }
    }
}
