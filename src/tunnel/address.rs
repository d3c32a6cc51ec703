//! Target address decoding
//!
//! Every address variant is followed by a big-endian port and a two-byte
//! delimiter. The delimiter is consumed to keep the stream position right
//! but its value is never inspected.
//!
//! ```text
//! IPv4:   | 4 addr | 2 port | 2 delim |                 (8 bytes)
//! IPv6:   | 16 addr | 2 port | 2 delim |                (20 bytes)
//! Domain: | 1 len | len domain | 2 port | 2 delim |     (1 + len + 4 bytes)
//! ```

use super::consts::*;
use super::types::TargetAddr;
use crate::error::TunnelError;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Decode a target address of type `addr_type` from `reader`
///
/// Returns the address and the number of bytes consumed. Nothing beyond the
/// address field is read, even when decoding fails on its contents.
pub async fn read_target_addr<R>(
    addr_type: u8,
    reader: &mut R,
) -> Result<(TargetAddr, usize), TunnelError>
where
    R: AsyncRead + Unpin,
{
    match addr_type {
        ADDR_TYPE_IPV4 => {
            let mut field = [0u8; IPV4_FIELD_LEN];
            reader
                .read_exact(&mut field)
                .await
                .map_err(|e| TunnelError::handshake("IPv4 address", e))?;

            let ip = Ipv4Addr::new(field[0], field[1], field[2], field[3]);
            let port = u16::from_be_bytes([field[4], field[5]]);
            Ok((TargetAddr::ipv4(ip, port), IPV4_FIELD_LEN))
        }

        ADDR_TYPE_IPV6 => {
            let mut field = [0u8; IPV6_FIELD_LEN];
            reader
                .read_exact(&mut field)
                .await
                .map_err(|e| TunnelError::handshake("IPv6 address", e))?;

            let mut octets = [0u8; 16];
            octets.copy_from_slice(&field[..16]);
            let port = u16::from_be_bytes([field[16], field[17]]);
            Ok((TargetAddr::ipv6(Ipv6Addr::from(octets), port), IPV6_FIELD_LEN))
        }

        ADDR_TYPE_DOMAIN => {
            let len = reader
                .read_u8()
                .await
                .map_err(|e| TunnelError::handshake("domain length", e))?
                as usize;

            let mut field = vec![0u8; len + 2 + DELIMITER_LEN];
            reader
                .read_exact(&mut field)
                .await
                .map_err(|e| TunnelError::handshake("domain address", e))?;
            let consumed = 1 + field.len();

            let port = u16::from_be_bytes([field[len], field[len + 1]]);
            field.truncate(len);

            let domain = String::from_utf8(field).map_err(|e| {
                TunnelError::InvalidDomain(format!(
                    "{} (invalid UTF-8)",
                    String::from_utf8_lossy(e.as_bytes())
                ))
            })?;

            Ok((TargetAddr::domain(domain, port), consumed))
        }

        other => Err(TunnelError::UnsupportedAddressType(other)),
    }
}
