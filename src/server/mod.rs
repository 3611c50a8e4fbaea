// ABOUTME: HTTP front door triggering named tasks behind a token check
// ABOUTME: Exports the router, token verifier and the serve loop

pub mod auth;
pub mod error;
pub mod router;

pub use auth::{TokenVerifier, TOKEN_HEADER};
pub use error::{Result, ServerError};
pub use router::{build_router, AppState};

use tokio::net::TcpListener;
use tracing::{info, warn};

/// Bind on all interfaces and serve until Ctrl-C.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    if !state.verifier.is_configured() {
        warn!("No secret configured, every /call request will be rejected");
    }

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("Listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
