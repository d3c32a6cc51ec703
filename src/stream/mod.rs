//! Byte-stream adapters over message channels
//!
//! A session arrives as a channel of discrete chunks. The tunnel code wants
//! an ordered byte stream it can `read_exact` from and `write_all` to, so
//! this module provides:
//!
//! - [`ChunkReader`]: an [`AsyncRead`](tokio::io::AsyncRead) over a stream of
//!   [`Hunk`]s, buffering whatever the last fetch returned
//! - [`ChunkWriter`]: an [`AsyncWrite`](tokio::io::AsyncWrite) that sends every
//!   write as one outbound chunk
//! - [`Duplex`]: joins a read side and a write side into one endpoint,
//!   optionally failing fast once a [`CancellationToken`] is set
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod duplex;
mod reader;
mod writer;

pub use duplex::Duplex;
pub use reader::ChunkReader;
pub use writer::ChunkWriter;

use bytes::Bytes;
use futures::{Sink, Stream};
use std::fmt;
use std::io;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Type-erased inbound side of a message channel
pub type BoxHunkStream = Pin<Box<dyn Stream<Item = io::Result<Hunk>> + Send>>;

/// Type-erased outbound side of a message channel
pub type BoxChunkSink = Pin<Box<dyn Sink<Bytes, Error = io::Error> + Send>>;

/// Session endpoint built over a message channel
pub type SessionStream = Duplex<ChunkReader<BoxHunkStream>, ChunkWriter<BoxChunkSink>>;

/// Build the byte-stream endpoint of one session from its message channel
///
/// Reads pull from `source`, writes go out through `sink`, and both fail
/// fast once `cancel` is set.
pub fn session_endpoint<St, Si>(source: St, sink: Si, cancel: CancellationToken) -> SessionStream
where
    St: Stream<Item = io::Result<Hunk>> + Send + 'static,
    Si: Sink<Bytes, Error = io::Error> + Send + 'static,
{
    let source: BoxHunkStream = Box::pin(source);
    let sink: BoxChunkSink = Box::pin(sink);
    Duplex::with_cancel(ChunkReader::new(source), ChunkWriter::new(sink), cancel)
}

/// One inbound fetch from a message channel
///
/// Depending on the channel shape a single receive yields one chunk or a
/// list of chunks. A fetch carrying no bytes at all is end-of-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hunk {
    /// A single chunk
    Single(Bytes),
    /// Several chunks delivered by one receive, in order
    Multi(Vec<Bytes>),
}

impl Hunk {
    /// Whether this fetch carries no payload bytes
    pub fn is_empty(&self) -> bool {
        match self {
            Hunk::Single(chunk) => chunk.is_empty(),
            Hunk::Multi(chunks) => chunks.iter().all(|c| c.is_empty()),
        }
    }

    /// Total payload length across all chunks
    pub fn len(&self) -> usize {
        match self {
            Hunk::Single(chunk) => chunk.len(),
            Hunk::Multi(chunks) => chunks.iter().map(|c| c.len()).sum(),
        }
    }

    /// Non-empty chunks in delivery order
    pub fn into_chunks(self) -> Vec<Bytes> {
        match self {
            Hunk::Single(chunk) if chunk.is_empty() => Vec::new(),
            Hunk::Single(chunk) => vec![chunk],
            Hunk::Multi(chunks) => chunks.into_iter().filter(|c| !c.is_empty()).collect(),
        }
    }
}

impl From<Bytes> for Hunk {
    fn from(chunk: Bytes) -> Self {
        Hunk::Single(chunk)
    }
}

impl From<Vec<u8>> for Hunk {
    fn from(chunk: Vec<u8>) -> Self {
        Hunk::Single(Bytes::from(chunk))
    }
}

impl From<Vec<Bytes>> for Hunk {
    fn from(chunks: Vec<Bytes>) -> Self {
        Hunk::Multi(chunks)
    }
}

/// Marker carried inside an `io::Error` when a cancelled endpoint is used
#[derive(Debug)]
struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Build the error returned by endpoints whose cancellation token is set
pub fn cancelled_error() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, Cancelled)
}

/// Check whether an `io::Error` came from a cancelled endpoint
pub fn is_cancelled_error(err: &io::Error) -> bool {
    err.get_ref()
        .map(|inner| inner.is::<Cancelled>())
        .unwrap_or(false)
}
