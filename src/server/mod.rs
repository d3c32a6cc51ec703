//! Server module for hunkrelay
//!
//! This module contains the accept loop and the per-connection session
//! driver that hands each WebSocket session to the tunnel handler.

#[allow(clippy::module_inception)]
mod server;
mod session;

pub use server::Server;
pub use session::serve_connection;

use crate::config::{Config, TransportType};
#[cfg(feature = "rustls-tls")]
use crate::transport::TlsAcceptor;
use crate::transport::TcpAcceptor;
use anyhow::Result;
use tokio::sync::broadcast;

/// Run the server with the given configuration until shutdown
pub async fn run_server(config: Config, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    let server_config = config.server;

    match server_config.transport.transport_type {
        TransportType::Tcp => {
            let server = Server::<TcpAcceptor>::bind(server_config).await?;
            server.run(shutdown_rx).await
        }
        #[cfg(feature = "rustls-tls")]
        TransportType::Tls => {
            let server = Server::<TlsAcceptor>::bind(server_config).await?;
            server.run(shutdown_rx).await
        }
        #[cfg(not(feature = "rustls-tls"))]
        TransportType::Tls => {
            anyhow::bail!("TLS transport is not enabled. Recompile with --features rustls-tls")
        }
    }
}
