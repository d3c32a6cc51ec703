//! Main server structure
//!
//! Owns the listener and runs the accept loop. Every accepted connection is
//! one session, served on its own task under a child of the server's root
//! cancellation token.

use super::session::serve_connection;
use crate::config::ServerConfig;
use crate::error::HunkRelayError;
use crate::helper::{duration_from_secs, DEFAULT_ACCEPT_TIMEOUT_SECS};
use crate::transport::{Acceptor, SocketOpts};
use crate::tunnel::{TcpDialer, TunnelHandler};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Tunnel server bound to its listen address
pub struct Server<A: Acceptor> {
    config: ServerConfig,
    acceptor: Arc<A>,
    handler: TunnelHandler,
    listener: TcpListener,
}

impl<A: Acceptor> std::fmt::Debug for Server<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("bind_addr", &self.config.bind_addr)
            .field("acceptor", &self.acceptor)
            .finish()
    }
}

impl<A: Acceptor> Server<A> {
    /// Build the acceptor and bind the listener
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let acceptor = Arc::new(A::new(&config.transport)?);
        let dialer = TcpDialer::new(SocketOpts::from_tcp_config(&config.transport.tcp));
        let handler = TunnelHandler::with_tcp_dialer(&config.tunnel, dialer);

        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

        Ok(Server {
            config,
            acceptor,
            handler,
            listener,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop until shutdown
    ///
    /// On shutdown every in-flight session is cancelled and awaited before
    /// this returns.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        info!("Listening on {}", self.local_addr()?);
        info!("WebSocket path: {}", self.config.path);

        let limit = self.config.max_sessions.min(u32::MAX as usize);
        let permits = Arc::new(Semaphore::new(limit));
        let root = CancellationToken::new();
        let path: Arc<str> = Arc::from(self.config.path.as_str());
        let accept_timeout = duration_from_secs(DEFAULT_ACCEPT_TIMEOUT_SECS);
        let mut next_id: u64 = 0;

        loop {
            let permit = tokio::select! {
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = shutdown_rx.recv() => break,
            };

            let (conn, peer_addr) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!("Accept error: {}", e);
                        continue;
                    }
                },
                _ = shutdown_rx.recv() => break,
            };

            next_id += 1;
            let span = info_span!("session", id = next_id, peer = %peer_addr);
            let acceptor = self.acceptor.clone();
            let handler = self.handler.clone();
            let path = path.clone();
            let cancel = root.child_token();

            tokio::spawn(
                async move {
                    debug!("New connection");
                    let result = serve_connection(
                        acceptor.as_ref(),
                        &handler,
                        &path,
                        conn,
                        accept_timeout,
                        cancel,
                    )
                    .await;
                    log_outcome(result);
                    drop(permit);
                }
                .instrument(span),
            );
        }

        info!("Shutdown signal received, cancelling sessions");
        root.cancel();
        if permits.acquire_many(limit as u32).await.is_err() {
            warn!("Session limiter closed before all sessions finished");
        }

        info!("Server stopped");
        Ok(())
    }
}

fn log_outcome(result: Result<(), HunkRelayError>) {
    match result {
        Ok(()) => info!("Session finished"),
        Err(HunkRelayError::Tunnel(e)) if e.is_cancelled() => debug!("Session cancelled"),
        Err(e) => warn!("Session ended: {}", e),
    }
}
