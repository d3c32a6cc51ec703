//! Session handshake parser
//!
//! Reads the request prefix that opens every session.

use super::address::read_target_addr;
use super::consts::*;
use super::types::{Command, HandshakeRequest};
use crate::error::TunnelError;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Parse a handshake from the stream
///
/// # Handshake Format
///
/// ```text
/// +------------+-------+-----+------+----------+----------+-------+
/// | CREDENTIAL | DELIM | CMD | ATYP | DST.ADDR | DST.PORT | DELIM |
/// +------------+-------+-----+------+----------+----------+-------+
/// |     56     |   2   |  1  |  1   | Variable |    2     |   2   |
/// +------------+-------+-----+------+----------+----------+-------+
/// ```
///
/// The credential is consumed without being checked. For UDP ASSOCIATE and
/// unknown commands the stream is left right after `ATYP` and no address is
/// decoded; the caller is expected to reject the request.
pub async fn parse_handshake<S>(stream: &mut S) -> Result<HandshakeRequest, TunnelError>
where
    S: AsyncRead + Unpin,
{
    let mut credential = [0u8; CREDENTIAL_LEN];
    stream
        .read_exact(&mut credential)
        .await
        .map_err(|e| TunnelError::handshake("credential", e))?;

    let mut delimiter = [0u8; DELIMITER_LEN];
    stream
        .read_exact(&mut delimiter)
        .await
        .map_err(|e| TunnelError::handshake("delimiter", e))?;

    let mut header = [0u8; 2];
    stream
        .read_exact(&mut header)
        .await
        .map_err(|e| TunnelError::handshake("command header", e))?;

    let command = Command::from_byte(header[0]);
    let addr_type = header[1];

    let request = match command {
        Command::Connect => {
            let (target, _) = read_target_addr(addr_type, stream).await?;
            HandshakeRequest::connect(target)
        }
        Command::UdpAssociate | Command::Unknown(_) => HandshakeRequest {
            command,
            target: None,
        },
    };

    tracing::debug!(
        "Parsed handshake: {} {}",
        request.command,
        request
            .target
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_default()
    );

    Ok(request)
}
