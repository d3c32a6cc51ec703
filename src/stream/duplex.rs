//! Read/write composition with optional cancellation

use super::cancelled_error;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_util::sync::CancellationToken;

/// One stream endpoint built from a separate read side and write side
///
/// When built with [`Duplex::with_cancel`], every operation first checks the
/// token and fails with [`cancelled_error`](super::cancelled_error) instead of
/// touching the underlying halves once it is set.
#[derive(Debug)]
pub struct Duplex<R, W> {
    reader: R,
    writer: W,
    cancel: Option<CancellationToken>,
}

impl<R, W> Duplex<R, W> {
    /// Combine a read side and a write side
    pub fn new(reader: R, writer: W) -> Self {
        Duplex {
            reader,
            writer,
            cancel: None,
        }
    }

    /// Combine a read side and a write side, checked against `cancel`
    pub fn with_cancel(reader: R, writer: W, cancel: CancellationToken) -> Self {
        Duplex {
            reader,
            writer,
            cancel: Some(cancel),
        }
    }

    /// Split back into the read and write sides
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn check_cancelled(&self) -> io::Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(cancelled_error()),
            _ => Ok(()),
        }
    }
}

impl<R, W> AsyncRead for Duplex<R, W>
where
    R: AsyncRead + Unpin,
    W: Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.check_cancelled()?;
        Pin::new(&mut this.reader).poll_read(cx, buf)
    }
}

impl<R, W> AsyncWrite for Duplex<R, W>
where
    R: Unpin,
    W: AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        this.check_cancelled()?;
        Pin::new(&mut this.writer).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.check_cancelled()?;
        Pin::new(&mut this.writer).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.check_cancelled()?;
        Pin::new(&mut this.writer).poll_shutdown(cx)
    }
}
