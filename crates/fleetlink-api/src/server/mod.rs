//! HTTP server for the fleet backend.

pub mod router;
pub mod state;

pub use router::create_router_with_state;
pub use state::ServerState;

use std::net::SocketAddr;
use std::path::Path;

/// Start the web server on a specific address and block until shutdown.
pub async fn run(bind: SocketAddr, data_dir: &Path) -> anyhow::Result<()> {
    let state = ServerState::open(data_dir)?;
    let app = create_router_with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, data_dir = %data_dir.display(), "fleetlink server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
    }
}
