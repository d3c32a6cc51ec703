//! Tunnel handshake constants
//!
//! Field sizes and code points of the handshake that precedes every
//! relayed session.

/// Length of the opaque credential field
pub const CREDENTIAL_LEN: usize = 56;

/// Length of each delimiter field
pub const DELIMITER_LEN: usize = 2;

/// Delimiter bytes written by [`HandshakeRequest::encode`](super::HandshakeRequest::encode).
/// Incoming delimiters are discarded without being compared.
pub const DELIMITER: [u8; DELIMITER_LEN] = *b"\r\n";

// Commands
/// TCP CONNECT command
pub const CMD_CONNECT: u8 = 0x01;
/// UDP ASSOCIATE command (rejected)
pub const CMD_UDP_ASSOCIATE: u8 = 0x03;

// Address types
/// IPv4 address
pub const ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address
pub const ADDR_TYPE_IPV6: u8 = 0x04;

/// Maximum domain name length
pub const MAX_DOMAIN_LEN: usize = 255;

/// Bytes consumed by the IPv4 address field: address, port, delimiter
pub const IPV4_FIELD_LEN: usize = 4 + 2 + DELIMITER_LEN;

/// Bytes consumed by the IPv6 address field: address, port, delimiter
pub const IPV6_FIELD_LEN: usize = 16 + 2 + DELIMITER_LEN;
