//! Server configuration types
//!
//! Defines the main configuration structures for the hunkrelay server.

use super::{TransportConfig, TunnelConfig};
use serde::{Deserialize, Serialize};

/// Default WebSocket path
fn default_path() -> String {
    "/tunnel".to_string()
}

/// Default concurrent session limit
fn default_max_sessions() -> usize {
    1024
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
}

/// Server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8443")
    pub bind_addr: String,

    /// WebSocket path sessions are accepted on
    #[serde(default = "default_path")]
    pub path: String,

    /// Maximum number of concurrently served sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Tunnel session configuration
    #[serde(default)]
    pub tunnel: TunnelConfig,

    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,
}

impl ServerConfig {
    /// Create a configuration with defaults for everything but the address
    pub fn new(bind_addr: impl Into<String>) -> Self {
        ServerConfig {
            bind_addr: bind_addr.into(),
            path: default_path(),
            max_sessions: default_max_sessions(),
            tunnel: TunnelConfig::default(),
            transport: TransportConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bind_addr.is_empty() {
            return Err("bind_addr must not be empty".to_string());
        }
        if !self.path.starts_with('/') {
            return Err(format!("path must start with '/': {}", self.path));
        }
        if self.max_sessions == 0 {
            return Err("max_sessions must be greater than zero".to_string());
        }
        self.tunnel.validate()?;
        self.transport.validate()
    }
}
