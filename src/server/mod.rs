// Server module entry point
// Listener creation, the accept loop and per-connection serving

pub mod connection;
pub mod listener;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::{AssetsConfig, Config, Timeouts};
use crate::handler::AssetService;
use crate::logger::{AccessLog, Logger};

pub use listener::create_listener;

/// Pause after a failed accept so a persistent error does not spin the loop
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Everything a connection needs, shared by all connections
#[derive(Debug, Clone)]
pub struct App {
    assets: Arc<AssetsConfig>,
    logger: Arc<Logger>,
    timeouts: Timeouts,
}

impl App {
    pub fn new(config: &Config, logger: Arc<Logger>) -> Self {
        Self::with_assets(config.assets.clone(), config.performance.timeouts(), logger)
    }

    pub fn with_assets(assets: AssetsConfig, timeouts: Timeouts, logger: Arc<Logger>) -> Self {
        Self {
            assets: Arc::new(assets),
            logger,
            timeouts,
        }
    }

    /// The request pipeline: access logging around deadline-bound asset serving
    pub fn service(&self) -> AccessLog<AssetService> {
        let assets = AssetService::new(Arc::clone(&self.assets), Arc::clone(&self.logger))
            .with_deadline(self.timeouts.write);
        AccessLog::new(assets, Arc::clone(&self.logger))
    }
}

/// Accept connections until `shutdown` resolves.
///
/// Accept errors (e.g. running out of file descriptors) are logged and the
/// loop keeps going. Connections already being served are left to finish
/// on their own tasks.
pub async fn serve(listener: TcpListener, app: App, shutdown: impl Future<Output = ()>) {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        app.logger.debug(&format!("Accepted connection from {peer_addr}"));
                        connection::spawn_connection(
                            stream,
                            peer_addr,
                            app.service(),
                            Arc::clone(&app.logger),
                            app.timeouts.read,
                        );
                    }
                    Err(e) => {
                        app.logger.error(&format!("Failed to accept connection: {e}"));
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }

            () = &mut shutdown => {
                app.logger.info("Shutdown requested, no longer accepting connections");
                return;
            }
        }
    }
}
