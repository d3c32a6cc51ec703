//! Helper utilities for hunkrelay
//!
//! Shared defaults and small utility functions.

use std::time::Duration;

/// Default per-direction relay buffer size
pub const DEFAULT_RELAY_BUFFER_SIZE: usize = 1024;

/// Default outbound dial timeout in seconds
pub const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 5;

/// Time allowed for the TLS and WebSocket handshakes of an accepted connection
pub const DEFAULT_ACCEPT_TIMEOUT_SECS: u64 = 10;

/// Parse duration from seconds
pub fn duration_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}
