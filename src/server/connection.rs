// Connection handling module
// Serves one accepted TCP connection on its own task

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;

use crate::handler::AssetService;
use crate::logger::{AccessLog, Logger};

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive and the header read timeout
/// 3. Serves the connection with the logged asset service
///
/// The connection lives as long as the client keeps it; per-request
/// deadlines are enforced by the service.
pub fn spawn_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    service: AccessLog<AssetService>,
    logger: Arc<Logger>,
    header_read_timeout: Option<Duration>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(true);
        if let Some(read_timeout) = header_read_timeout {
            builder.timer(TokioTimer::new());
            builder.header_read_timeout(read_timeout);
        }

        if let Err(err) = builder.serve_connection(io, service).await {
            logger.connection_error(&peer_addr, &err);
        }
    });
}
