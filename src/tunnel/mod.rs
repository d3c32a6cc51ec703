//! Tunnel protocol
//!
//! Everything that happens on one session once the transport has turned it
//! into a byte stream: handshake parsing, dialing the requested target, and
//! relaying until either side is done.

mod address;
pub mod consts;
mod dialer;
mod handler;
mod handshake;
mod relay;
mod types;

pub use address::read_target_addr;
pub use dialer::{Dialer, TcpDialer};
pub use handler::{SessionState, TunnelHandler};
pub use handshake::parse_handshake;
pub use relay::relay;
pub use types::{Command, HandshakeRequest, TargetAddr};
