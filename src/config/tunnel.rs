//! Tunnel session configuration
//!
//! Defines the per-session dial and relay parameters.

use crate::helper::{DEFAULT_DIAL_TIMEOUT_SECS, DEFAULT_RELAY_BUFFER_SIZE};
use serde::{Deserialize, Serialize};

/// Default dial timeout in seconds
fn default_dial_timeout() -> u64 {
    DEFAULT_DIAL_TIMEOUT_SECS
}

/// Default relay buffer size in bytes
fn default_relay_buffer_size() -> usize {
    DEFAULT_RELAY_BUFFER_SIZE
}

/// Tunnel session configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TunnelConfig {
    /// Timeout for the outbound dial in seconds
    #[serde(default = "default_dial_timeout")]
    pub dial_timeout: u64,

    /// Per-direction relay buffer size in bytes
    #[serde(default = "default_relay_buffer_size")]
    pub relay_buffer_size: usize,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        TunnelConfig {
            dial_timeout: default_dial_timeout(),
            relay_buffer_size: default_relay_buffer_size(),
        }
    }
}

impl TunnelConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.dial_timeout == 0 {
            return Err("dial_timeout must be greater than zero".to_string());
        }
        if self.relay_buffer_size == 0 {
            return Err("relay_buffer_size must be greater than zero".to_string());
        }
        Ok(())
    }
}
