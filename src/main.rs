//! Caching Proxy - A forwarding HTTP/1.0 proxy with an in-memory object cache
//!
//! Usage: `caching_proxy <PORT>`

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caching_proxy::api::{create_router, AdminState};
use caching_proxy::config::{Cli, Config};
use caching_proxy::{run_listener, ProxyState};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Parse the listening port from the command line
/// 2. Initialize tracing subscriber for logging
/// 3. Load the rest of the configuration from environment variables
/// 4. Create the shared cache store
/// 5. Start the admin API if `ADMIN_PORT` is set
/// 6. Accept client connections until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caching_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting caching proxy");

    let config = Config::from_cli(&cli);
    info!(
        "Configuration loaded: port={}, slots={}, max_object_size={}, default_target={}:{}",
        config.listen_port,
        config.cache_slots,
        config.max_object_size,
        config.default_target_host,
        config.default_target_port
    );

    let state = ProxyState::from_config(config.clone());
    info!("Cache store initialized");

    let admin = match config.admin_port {
        Some(port) => {
            let addr = SocketAddr::from(([127, 0, 0, 1], port));
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind admin API on {}", addr))?;
            info!("Admin API listening on http://{}", addr);

            let app = create_router(AdminState::new(state.cache.clone()));
            Some(tokio::spawn(async move {
                if let Err(err) = axum::serve(listener, app).await {
                    warn!(error = %err, "admin API stopped");
                }
            }))
        }
        None => None,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind proxy on {}", addr))?;
    info!("Proxy listening on {}", addr);

    tokio::select! {
        _ = run_listener(listener, state) => {}
        _ = shutdown_signal() => {}
    }

    if let Some(admin) = admin {
        admin.abort();
    }
    info!("Proxy shutdown complete");

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
