//! HTTP server startup logic.

use std::net::{IpAddr, SocketAddr};

use axum::Router;
use axum_server::Handle;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen host {0:?}")]
    InvalidHost(String),

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Resolve the listen address from a host string and port.
pub fn listen_addr(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let ip: IpAddr = host
        .parse()
        .map_err(|_| ServerError::InvalidHost(host.to_string()))?;
    Ok(SocketAddr::new(ip, port))
}

/// Start the HTTP server on `host:port`.
///
/// This function blocks until the server shuts down.
pub async fn start_server(app: Router, host: &str, port: u16) -> Result<(), ServerError> {
    let addr = listen_addr(host, port)?;
    let handle = Handle::new();

    shutdown::setup_shutdown_handler(handle.clone());

    tracing::info!(%addr, "Listening");

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
