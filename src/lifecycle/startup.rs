//! Startup orchestration.
//!
//! Fail fast: any startup error is returned to `main`. The listener binds
//! last so traffic only arrives once everything else is in place.

use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Bring the proxy up and serve until a termination signal arrives.
pub async fn run(config: ProxyConfig) -> io::Result<()> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_redirects = config.forward.max_redirects,
        rate_limit_enabled = config.rate_limit.enabled,
        rate_limit_max_requests = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config.clone())?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await
}
