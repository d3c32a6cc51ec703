//! Tunnel type definitions
//!
//! Defines the connection request decoded from a session handshake.

use super::consts::*;
use crate::error::TunnelError;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Handshake command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// TCP CONNECT - establish a TCP connection to target
    Connect,
    /// UDP ASSOCIATE - always rejected
    UdpAssociate,
    /// Any other command byte
    Unknown(u8),
}

impl Command {
    /// Parse a command byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            CMD_CONNECT => Command::Connect,
            CMD_UDP_ASSOCIATE => Command::UdpAssociate,
            other => Command::Unknown(other),
        }
    }

    /// Convert to the wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            Command::Connect => CMD_CONNECT,
            Command::UdpAssociate => CMD_UDP_ASSOCIATE,
            Command::Unknown(byte) => byte,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Connect => write!(f, "CONNECT"),
            Command::UdpAssociate => write!(f, "UDP ASSOCIATE"),
            Command::Unknown(byte) => write!(f, "UNKNOWN({:#04x})", byte),
        }
    }
}

/// Target address of a tunnel request
///
/// Either an IP address (v4 or v6) or a domain name, always with a port.
/// Domains are kept unresolved; the dialer resolves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    /// IP address with port
    Ip(SocketAddr),
    /// Domain name with port
    Domain(String, u16),
}

impl TargetAddr {
    /// Create a new TargetAddr from an IPv4 address and port
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V4(ip), port))
    }

    /// Create a new TargetAddr from an IPv6 address and port
    pub fn ipv6(ip: Ipv6Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V6(ip), port))
    }

    /// Create a new TargetAddr from a domain name and port
    pub fn domain(domain: impl Into<String>, port: u16) -> Self {
        TargetAddr::Domain(domain.into(), port)
    }

    /// Textual host: an IP literal or the domain name
    pub fn host(&self) -> String {
        match self {
            TargetAddr::Ip(addr) => addr.ip().to_string(),
            TargetAddr::Domain(domain, _) => domain.clone(),
        }
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ip(addr) => addr.port(),
            TargetAddr::Domain(_, port) => *port,
        }
    }

    /// Get the address type byte
    pub fn addr_type(&self) -> u8 {
        match self {
            TargetAddr::Ip(SocketAddr::V4(_)) => ADDR_TYPE_IPV4,
            TargetAddr::Ip(SocketAddr::V6(_)) => ADDR_TYPE_IPV6,
            TargetAddr::Domain(_, _) => ADDR_TYPE_DOMAIN,
        }
    }

    /// Serialize as address type, address, port and trailing delimiter
    pub fn to_bytes(&self) -> Result<Vec<u8>, TunnelError> {
        let mut bytes = vec![self.addr_type()];

        match self {
            TargetAddr::Ip(SocketAddr::V4(addr)) => {
                bytes.extend_from_slice(&addr.ip().octets());
            }
            TargetAddr::Ip(SocketAddr::V6(addr)) => {
                bytes.extend_from_slice(&addr.ip().octets());
            }
            TargetAddr::Domain(domain, _) => {
                let len = u8::try_from(domain.len()).map_err(|_| {
                    TunnelError::InvalidDomain(format!("{} bytes long", domain.len()))
                })?;
                bytes.push(len);
                bytes.extend_from_slice(domain.as_bytes());
            }
        }

        bytes.extend_from_slice(&self.port().to_be_bytes());
        bytes.extend_from_slice(&DELIMITER);
        Ok(bytes)
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{}", addr),
            TargetAddr::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

impl From<SocketAddr> for TargetAddr {
    fn from(addr: SocketAddr) -> Self {
        TargetAddr::Ip(addr)
    }
}

/// Connection request decoded from a session handshake
///
/// `target` is present only for [`Command::Connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    /// Requested command
    pub command: Command,
    /// Decoded target address
    pub target: Option<TargetAddr>,
}

impl HandshakeRequest {
    /// A CONNECT request to `target`
    pub fn connect(target: TargetAddr) -> Self {
        HandshakeRequest {
            command: Command::Connect,
            target: Some(target),
        }
    }

    /// Serialize the full handshake prefix, as a client would send it
    pub fn encode(&self, credential: &[u8; CREDENTIAL_LEN]) -> Result<Vec<u8>, TunnelError> {
        let mut bytes = Vec::with_capacity(CREDENTIAL_LEN + DELIMITER_LEN + 2 + IPV6_FIELD_LEN);
        bytes.extend_from_slice(credential);
        bytes.extend_from_slice(&DELIMITER);
        bytes.push(self.command.to_byte());

        match &self.target {
            Some(target) => bytes.extend_from_slice(&target.to_bytes()?),
            None => bytes.push(ADDR_TYPE_IPV4),
        }

        Ok(bytes)
    }
}
