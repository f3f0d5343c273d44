// src/main.rs
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

mod config;
mod locator;
mod relay;
mod server;

use crate::{
    locator::Locator,
    relay::{Forwarder, Relay, StaticFiles},
    server::{handler::RequestHandler, ServerBuilder},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ollama_relay=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path).await?;

    let cwd = std::env::current_dir()?;
    info!("Working directory: {}", cwd.display());

    // Resolve the backend once, before the listener binds. The result is
    // immutable for the rest of the process.
    let locator = Locator::new(config.probe_timeout())?;
    let backend = Arc::new(locator.resolve(&config.backend_candidates).await?);
    if !backend.healthy {
        info!(
            "Backend {} selected without a successful probe; forwarded requests may fail",
            backend.base_url
        );
    }

    let forwarder = Forwarder::new(backend, config.forward_timeout())?;
    let statics = StaticFiles::new(&config.static_root)?;
    let relay = Arc::new(Relay::new(config.forward_prefix.clone(), forwarder, statics));
    let handler = RequestHandler::new(relay);

    // Start main server
    let addr: SocketAddr = ([0, 0, 0, 0], config.listen_port).into();
    info!("Starting relay on {}", addr);
    info!("Open the application at: http://localhost:{}", config.listen_port);

    ServerBuilder::new(addr)
        .with_handler(handler)
        .serve(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
