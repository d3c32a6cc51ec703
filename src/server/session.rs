//! Per-connection session driver
//!
//! Takes one accepted TCP connection through the transport handshake and
//! the WebSocket upgrade, then runs the tunnel session over it.

use crate::error::HunkRelayError;
use crate::transport::websocket::{accept_websocket, websocket_endpoint};
use crate::transport::Acceptor;
use crate::tunnel::TunnelHandler;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Serve one inbound connection as a single tunnel session
///
/// `accept_timeout` bounds the transport and WebSocket handshakes together;
/// the tunnel session itself is bounded only by `cancel`.
pub async fn serve_connection<A: Acceptor>(
    acceptor: &A,
    handler: &TunnelHandler,
    path: &str,
    conn: TcpStream,
    accept_timeout: Duration,
    cancel: CancellationToken,
) -> Result<(), HunkRelayError> {
    let upgrade = async {
        let stream = acceptor
            .accept(conn)
            .await
            .map_err(|e| HunkRelayError::Transport(format!("{:#}", e)))?;
        accept_websocket(stream, path).await
    };

    let ws = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(crate::error::TunnelError::Cancelled.into()),
        result = tokio::time::timeout(accept_timeout, upgrade) => result
            .map_err(|_| HunkRelayError::Transport("Handshake timed out".to_string()))??,
    };
    debug!("WebSocket session accepted");

    let endpoint = websocket_endpoint(ws, cancel.clone());
    handler.handle(endpoint, &cancel).await?;
    Ok(())
}
