//! Test utilities and mocks for hunkrelay
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Spawn a TCP target that echoes every connection back until EOF
pub async fn spawn_echo_target() -> (SocketAddr, JoinHandle<()>) {
    let (listener, addr) = create_test_listener().await;
    let handle = tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                loop {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if stream.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });
    (addr, handle)
}

/// Test configuration builder
pub struct TestConfigBuilder {
    bind_addr: String,
    path: String,
    dial_timeout: u64,
    relay_buffer_size: usize,
    max_sessions: usize,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        TestConfigBuilder {
            bind_addr: "127.0.0.1:0".to_string(),
            path: "/tunnel".to_string(),
            dial_timeout: 5,
            relay_buffer_size: 1024,
            max_sessions: 16,
        }
    }
}

impl TestConfigBuilder {
    /// Create a new test config builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bind address
    pub fn bind_addr(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Set WebSocket path
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Set dial timeout in seconds
    pub fn dial_timeout(mut self, secs: u64) -> Self {
        self.dial_timeout = secs;
        self
    }

    /// Set relay buffer size
    pub fn relay_buffer_size(mut self, size: usize) -> Self {
        self.relay_buffer_size = size;
        self
    }

    /// Set the concurrent session limit
    pub fn max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Build the configuration
    pub fn build(self) -> hunkrelay::config::ServerConfig {
        let mut config = hunkrelay::config::ServerConfig::new(self.bind_addr);
        config.path = self.path;
        config.max_sessions = self.max_sessions;
        config.tunnel = hunkrelay::config::TunnelConfig {
            dial_timeout: self.dial_timeout,
            relay_buffer_size: self.relay_buffer_size,
        };
        config
    }
}

/// Mock handshake preambles
pub mod handshake_mock {
    use hunkrelay::tunnel::consts::*;

    fn preamble(command: u8) -> Vec<u8> {
        let mut data = vec![b'x'; CREDENTIAL_LEN];
        data.extend_from_slice(&DELIMITER);
        data.push(command);
        data
    }

    /// Create a CONNECT preamble to an IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut data = preamble(CMD_CONNECT);
        data.push(ADDR_TYPE_IPV4);
        data.extend_from_slice(&ip);
        data.extend_from_slice(&port.to_be_bytes());
        data.extend_from_slice(&DELIMITER);
        data
    }

    /// Create a CONNECT preamble to a domain
    pub fn create_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut data = preamble(CMD_CONNECT);
        data.push(ADDR_TYPE_DOMAIN);
        data.push(domain.len() as u8);
        data.extend_from_slice(domain.as_bytes());
        data.extend_from_slice(&port.to_be_bytes());
        data.extend_from_slice(&DELIMITER);
        data
    }

    /// Create a UDP ASSOCIATE preamble
    pub fn create_udp_associate() -> Vec<u8> {
        let mut data = preamble(CMD_UDP_ASSOCIATE);
        data.push(ADDR_TYPE_IPV4);
        data.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
        data.extend_from_slice(&DELIMITER);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_echo_target() {
        let (addr, _handle) = spawn_echo_target().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        stream.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn test_config_builder() {
        let config = TestConfigBuilder::new()
            .path("/hunk")
            .dial_timeout(1)
            .relay_buffer_size(64)
            .build();

        assert_eq!(config.path, "/hunk");
        assert_eq!(config.tunnel.dial_timeout, 1);
        assert_eq!(config.tunnel.relay_buffer_size, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_handshake_mock_lengths() {
        assert_eq!(handshake_mock::create_connect_ipv4([127, 0, 0, 1], 80).len(), 56 + 2 + 2 + 4 + 2 + 2);
        assert_eq!(
            handshake_mock::create_connect_domain("example.com", 443).len(),
            56 + 2 + 2 + 1 + 11 + 2 + 2
        );
    }
}
