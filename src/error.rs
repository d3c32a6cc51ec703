//! Error types for hunkrelay
//!
//! This module defines the session-level error taxonomy and the
//! application-level error type used by the server layer.

use std::io;
use thiserror::Error;

/// Main error type for hunkrelay operations
#[derive(Error, Debug)]
pub enum HunkRelayError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Tunnel session error
    #[error("Tunnel error: {0}")]
    Tunnel(#[from] TunnelError),
}

/// Terminal status of a failed tunnel session
///
/// Every session ends either with `Ok(())` or with exactly one of these.
/// [`TunnelError::Cancelled`] is kept distinct from I/O failures so callers
/// can tell a deliberate shutdown apart from a broken peer.
#[derive(Error, Debug)]
pub enum TunnelError {
    /// Short or malformed read while consuming the handshake
    #[error("Handshake failed while reading {step}: {source}")]
    Handshake {
        /// Handshake field being read when the failure happened
        step: &'static str,
        /// Underlying read error
        #[source]
        source: io::Error,
    },

    /// Command byte is neither CONNECT nor UDP ASSOCIATE
    #[error("Unsupported command: {0:#04x}")]
    UnsupportedCommand(u8),

    /// UDP ASSOCIATE requested; UDP relaying is not offered
    #[error("UDP not supported")]
    UdpNotSupported,

    /// Address type byte is not IPv4, IPv6 or domain
    #[error("Unsupported address type: {0:#04x}")]
    UnsupportedAddressType(u8),

    /// Domain bytes are not valid UTF-8 or too long to encode
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// Outbound connection to the target failed or timed out
    #[error("Failed to dial {target}: {source}")]
    Dial {
        /// Target in host:port form
        target: String,
        /// Underlying connect error (TimedOut for the dial timeout)
        #[source]
        source: io::Error,
    },

    /// I/O failure on either relay direction
    #[error("Relay failed: {0}")]
    Relay(#[source] io::Error),

    /// The session's cancellation token was observed
    #[error("Session cancelled")]
    Cancelled,
}

impl TunnelError {
    /// Wrap a handshake read error, keeping cancellation distinct
    pub fn handshake(step: &'static str, source: io::Error) -> Self {
        if crate::stream::is_cancelled_error(&source) {
            TunnelError::Cancelled
        } else {
            TunnelError::Handshake { step, source }
        }
    }

    /// Wrap a relay I/O error, keeping cancellation distinct
    pub fn relay(source: io::Error) -> Self {
        if crate::stream::is_cancelled_error(&source) {
            TunnelError::Cancelled
        } else {
            TunnelError::Relay(source)
        }
    }

    /// Whether this status is a deliberate shutdown rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TunnelError::Cancelled)
    }
}
