//! Per-session tunnel handler
//!
//! Drives one session through its states:
//!
//! ```text
//! Start -> ReadingHandshake -> Dispatching -> Dialing -> Relaying -> Closed
//!                                         \-> Rejected ------------/
//! ```
//!
//! Any failure jumps straight to `Closed` carrying the error.

use super::dialer::{Dialer, TcpDialer};
use super::handshake::parse_handshake;
use super::relay::relay;
use super::types::{Command, TargetAddr};
use crate::config::TunnelConfig;
use crate::error::TunnelError;
use crate::transport::StreamDyn;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session endpoint received
    Start,
    /// Consuming the handshake prefix
    ReadingHandshake,
    /// Choosing what to do with the parsed command
    Dispatching,
    /// Opening the outbound connection
    Dialing,
    /// Copying bytes both ways
    Relaying,
    /// Command refused without dialing
    Rejected,
    /// Terminal
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Start => "start",
            SessionState::ReadingHandshake => "reading-handshake",
            SessionState::Dispatching => "dispatching",
            SessionState::Dialing => "dialing",
            SessionState::Relaying => "relaying",
            SessionState::Rejected => "rejected",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Handles tunnel sessions handed over by the transport
///
/// Cheap to clone; one instance serves every session of a server.
#[derive(Debug, Clone)]
pub struct TunnelHandler {
    dialer: Arc<dyn Dialer>,
    dial_timeout: Duration,
    buffer_size: usize,
}

impl TunnelHandler {
    /// Create a handler with a custom dialer
    pub fn new(config: &TunnelConfig, dialer: Arc<dyn Dialer>) -> Self {
        TunnelHandler {
            dialer,
            dial_timeout: Duration::from_secs(config.dial_timeout),
            buffer_size: config.relay_buffer_size,
        }
    }

    /// Create a handler dialing plain TCP
    pub fn with_tcp_dialer(config: &TunnelConfig, dialer: TcpDialer) -> Self {
        Self::new(config, Arc::new(dialer))
    }

    /// Timeout applied to every outbound dial
    pub fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }

    /// Per-direction relay buffer size
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Run one session to completion
    ///
    /// The returned value is the session's terminal status. `cancel` bounds
    /// the whole session: once set, any pending step stops and the session
    /// ends with [`TunnelError::Cancelled`].
    pub async fn handle<S>(&self, mut session: S, cancel: &CancellationToken) -> Result<(), TunnelError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut state = SessionState::Start;

        advance(&mut state, SessionState::ReadingHandshake);
        let request = match until_cancelled(cancel, parse_handshake(&mut session)).await {
            Ok(request) => request,
            Err(e) => return close(&mut state, Err(e)),
        };

        advance(&mut state, SessionState::Dispatching);
        let target = match (request.command, request.target) {
            (Command::Connect, Some(target)) => target,
            (Command::UdpAssociate, _) => {
                advance(&mut state, SessionState::Rejected);
                warn!("UDP ASSOCIATE rejected");
                return close(&mut state, Err(TunnelError::UdpNotSupported));
            }
            (command, _) => {
                advance(&mut state, SessionState::Rejected);
                warn!("{} rejected", command);
                return close(
                    &mut state,
                    Err(TunnelError::UnsupportedCommand(command.to_byte())),
                );
            }
        };

        advance(&mut state, SessionState::Dialing);
        let outbound = match until_cancelled(cancel, self.dial(&target)).await {
            Ok(stream) => stream,
            Err(e) => return close(&mut state, Err(e)),
        };

        info!("Tunnel established to {}", target);

        advance(&mut state, SessionState::Relaying);
        let result = relay(session, outbound, cancel, self.buffer_size).await;
        close(&mut state, result)
    }

    async fn dial(&self, target: &TargetAddr) -> Result<Box<dyn StreamDyn>, TunnelError> {
        debug!("Connecting to target: {}", target);

        self.dialer
            .dial(target, self.dial_timeout)
            .await
            .map_err(|source| {
                error!("Failed to connect to {}: {}", target, source);
                TunnelError::Dial {
                    target: target.to_string(),
                    source,
                }
            })
    }
}

/// Race `fut` against session cancellation
async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, TunnelError>
where
    F: Future<Output = Result<T, TunnelError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TunnelError::Cancelled),
        result = fut => result,
    }
}

fn advance(state: &mut SessionState, next: SessionState) {
    debug!("Session state {} -> {}", state, next);
    *state = next;
}

fn close(state: &mut SessionState, result: Result<(), TunnelError>) -> Result<(), TunnelError> {
    advance(state, SessionState::Closed);
    result
}
