use std::sync::Arc;

use assetd::config::Config;
use assetd::logger::Logger;
use assetd::server::{self, App};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;

    // Tokio runtime, worker threads from config or one per CPU core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))?;
    Ok(())
}

async fn async_main(cfg: Config) -> assetd::Result<()> {
    let logger = Arc::new(Logger::from_config(&cfg.logging)?);

    let addr = cfg.socket_addr()?;
    let listener = server::create_listener(addr)?;
    logger.server_started(&addr, &cfg);

    let app = App::new(&cfg, Arc::clone(&logger));
    server::serve(listener, app, shutdown_signal(Arc::clone(&logger))).await;
    Ok(())
}

/// Resolves on Ctrl+C; if the handler cannot be installed, never resolves
async fn shutdown_signal(logger: Arc<Logger>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger.warn(&format!("Failed to listen for Ctrl+C: {e}"));
        std::future::pending::<()>().await;
    }
}
