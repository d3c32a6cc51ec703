//! # hunkrelay - Chunk-Channel Tunnel Server
//!
//! hunkrelay accepts tunnel sessions carried as streams of discrete binary
//! chunks, turns each session into an ordinary byte stream, reads a
//! SOCKS5-style handshake from it, dials the requested target over TCP and
//! relays bytes in both directions until either side is done.
//!
//! ## Features
//!
//! - **Chunk-to-stream adapters**: read/write byte streams over message channels
//! - **Compact handshake**: credential, command and target in one preamble
//! - **Bidirectional relay**: fixed per-direction buffers, cooperative cancellation
//! - **WebSocket sessions**: one session per upgrade, over plain TCP or TLS
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hunkrelay::config::load_config;
//! use hunkrelay::server::run_server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_server(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Client -> WebSocket (binary chunks) -> hunkrelay -> TCP Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod helper;
pub mod server;
pub mod stream;
pub mod transport;
pub mod tunnel;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{HunkRelayError, TunnelError};
pub use server::run_server;
pub use stream::{ChunkReader, ChunkWriter, Duplex, Hunk};
pub use tunnel::{relay, TargetAddr, TunnelHandler};

/// Version of the hunkrelay library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
