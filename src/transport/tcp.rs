//! Plain TCP acceptor
//!
//! Accepted connections are used as-is once socket options are applied.

use super::{Acceptor, SocketOpts};
use crate::config::TransportConfig;
use anyhow::Result;
use async_trait::async_trait;
use tokio::net::TcpStream;

/// TCP acceptor for plain connections
#[derive(Debug, Clone, Default)]
pub struct TcpAcceptor {
    /// Socket options to apply to accepted connections
    socket_opts: SocketOpts,
}

impl TcpAcceptor {
    /// Set socket options
    pub fn with_socket_opts(mut self, opts: SocketOpts) -> Self {
        self.socket_opts = opts;
        self
    }

    /// Socket options applied to accepted connections
    pub fn socket_opts(&self) -> &SocketOpts {
        &self.socket_opts
    }
}

#[async_trait]
impl Acceptor for TcpAcceptor {
    type Stream = TcpStream;

    fn new(config: &TransportConfig) -> Result<Self> {
        Ok(TcpAcceptor {
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
        })
    }

    async fn accept(&self, conn: TcpStream) -> Result<Self::Stream> {
        Self::hint(&conn, &self.socket_opts);
        Ok(conn)
    }
}
