//! Transport module for hunkrelay
//!
//! This module provides the inbound transport abstraction (plain TCP or TLS),
//! the WebSocket session channel carried on top of it, and the socket
//! options shared by inbound and dialed connections.

mod tcp;
#[cfg(feature = "rustls-tls")]
mod tls;
pub mod websocket;

pub use tcp::TcpAcceptor;
#[cfg(feature = "rustls-tls")]
pub use tls::TlsAcceptor;

use crate::config::{TcpConfig, TransportConfig};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Socket options for configuring connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive timeout
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive interval
    pub keepalive_interval: Option<u64>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts {
            nodelay: true,
            keepalive_secs: Some(20),
            keepalive_interval: Some(8),
        }
    }
}

impl SocketOpts {
    /// Create socket options from TCP config
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: Some(config.keepalive_secs),
            keepalive_interval: Some(config.keepalive_interval),
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let (Some(timeout), Some(interval)) = (self.keepalive_secs, self.keepalive_interval) {
            let socket = socket2::SockRef::from(stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(timeout))
                .with_interval(Duration::from_secs(interval));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }
}

/// Acceptor trait for inbound connection types
///
/// An acceptor takes a freshly accepted TCP connection and turns it into
/// the byte stream the WebSocket handshake runs over.
#[async_trait]
pub trait Acceptor: Debug + Send + Sync + 'static {
    /// The stream type produced by this acceptor
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + Debug + 'static;

    /// Create a new acceptor instance from configuration
    fn new(config: &TransportConfig) -> Result<Self>
    where
        Self: Sized;

    /// Apply socket hints/options to an accepted connection
    fn hint(conn: &TcpStream, opts: &SocketOpts) {
        if let Err(e) = opts.apply(conn) {
            tracing::warn!("Failed to apply socket options: {}", e);
        }
    }

    /// Finish accepting a connection
    async fn accept(&self, conn: TcpStream) -> Result<Self::Stream>;
}

/// Dynamic stream trait for boxed streams
pub trait StreamDyn: AsyncRead + AsyncWrite + Unpin + Send + Sync + Debug {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + Sync + Debug> StreamDyn for T {}
