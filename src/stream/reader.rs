//! Read side of the chunk adapter

use super::Hunk;
use bytes::{Buf, BytesMut};
use futures::Stream;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Presents a stream of inbound [`Hunk`]s as an ordered byte stream
///
/// The accumulator is refilled by exactly one fetch, and only once it has
/// been fully drained. A read returns at most what is buffered, so callers
/// needing an exact length must loop (`read_exact` does).
///
/// End-of-stream is reported when a fetch carries no bytes or when the
/// underlying stream terminates; after that the source is never polled again.
#[derive(Debug)]
pub struct ChunkReader<S> {
    source: S,
    buf: BytesMut,
    eof: bool,
}

impl<S> ChunkReader<S>
where
    S: Stream<Item = io::Result<Hunk>> + Unpin,
{
    /// Wrap a chunk source
    pub fn new(source: S) -> Self {
        ChunkReader {
            source,
            buf: BytesMut::new(),
            eof: false,
        }
    }

    /// Bytes fetched but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Unwrap the source, discarding buffered bytes
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S> AsyncRead for ChunkReader<S>
where
    S: Stream<Item = io::Result<Hunk>> + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        out: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if out.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        if this.buf.is_empty() {
            if this.eof {
                return Poll::Ready(Ok(()));
            }

            match ready!(Pin::new(&mut this.source).poll_next(cx)) {
                None => {
                    this.eof = true;
                    return Poll::Ready(Ok(()));
                }
                Some(Err(e)) => return Poll::Ready(Err(e)),
                Some(Ok(hunk)) => {
                    for chunk in hunk.into_chunks() {
                        this.buf.extend_from_slice(&chunk);
                    }
                    if this.buf.is_empty() {
                        this.eof = true;
                        return Poll::Ready(Ok(()));
                    }
                }
            }
        }

        let n = out.remaining().min(this.buf.len());
        out.put_slice(&this.buf[..n]);
        this.buf.advance(n);
        Poll::Ready(Ok(()))
    }
}
