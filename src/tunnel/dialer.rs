//! Outbound connections to tunnel targets

use super::types::TargetAddr;
use crate::transport::{SocketOpts, StreamDyn};
use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Opens the outbound connection for a CONNECT request
#[async_trait]
pub trait Dialer: Send + Sync + Debug {
    /// Connect to `target`, giving up after `timeout`
    ///
    /// A timeout is reported as [`io::ErrorKind::TimedOut`].
    async fn dial(&self, target: &TargetAddr, timeout: Duration) -> io::Result<Box<dyn StreamDyn>>;
}

/// Plain TCP dialer
///
/// Domains are resolved by the connect call itself; every resolved address
/// is tried in turn within the same timeout.
#[derive(Debug, Clone, Default)]
pub struct TcpDialer {
    socket_opts: SocketOpts,
}

impl TcpDialer {
    /// Create a dialer applying `socket_opts` to every connection
    pub fn new(socket_opts: SocketOpts) -> Self {
        TcpDialer { socket_opts }
    }

    /// Socket options applied to dialed connections
    pub fn socket_opts(&self) -> &SocketOpts {
        &self.socket_opts
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, target: &TargetAddr, timeout: Duration) -> io::Result<Box<dyn StreamDyn>> {
        let addr = target.to_string();

        let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr.as_str())).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connection to {} timed out after {:?}", addr, timeout),
                ))
            }
        };

        if let Err(e) = self.socket_opts.apply(&stream) {
            warn!("Failed to apply socket options to {}: {}", addr, e);
        }

        debug!(
            "TCP connection established to {} ({:?})",
            addr,
            stream.peer_addr().ok()
        );

        Ok(Box::new(stream))
    }
}
