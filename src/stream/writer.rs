//! Write side of the chunk adapter

use bytes::Bytes;
use futures::Sink;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::AsyncWrite;

/// Sends every write as one outbound chunk
///
/// A successful write always reports the full buffer length. Empty writes
/// are accepted without sending anything: an empty chunk would read as
/// end-of-stream on the far side.
#[derive(Debug)]
pub struct ChunkWriter<K> {
    sink: K,
}

impl<K> ChunkWriter<K>
where
    K: Sink<Bytes, Error = io::Error> + Unpin,
{
    /// Wrap a chunk sink
    pub fn new(sink: K) -> Self {
        ChunkWriter { sink }
    }

    /// Unwrap the sink
    pub fn into_inner(self) -> K {
        self.sink
    }
}

impl<K> AsyncWrite for ChunkWriter<K>
where
    K: Sink<Bytes, Error = io::Error> + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        ready!(Pin::new(&mut this.sink).poll_ready(cx))?;
        Pin::new(&mut this.sink).start_send(Bytes::copy_from_slice(buf))?;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().sink).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().sink).poll_close(cx)
    }
}
