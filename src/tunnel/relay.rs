//! Bidirectional relay between two stream endpoints
//!
//! Each direction copies through its own fixed buffer. The first direction
//! to finish cancels the shared scope, the sibling stops at its next I/O
//! step, and both are awaited before the relay returns. Write halves are
//! shut down afterwards so each peer observes end-of-stream; a peer that
//! stopped reading gets [`SHUTDOWN_TIMEOUT`] before the half is abandoned.

use crate::error::TunnelError;
use futures::future::{self, Either};
use std::pin::pin;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Upper bound on closing one write half after the copy loops are done
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Relay bytes between `a` and `b` until one direction ends
///
/// Returns the status of the direction that terminated first: `Ok(())` for a
/// clean end-of-stream, its error otherwise. Cancelling `cancel` (the session
/// token) stops both directions and yields [`TunnelError::Cancelled`].
pub async fn relay<A, B>(
    a: A,
    b: B,
    cancel: &CancellationToken,
    buffer_size: usize,
) -> Result<(), TunnelError>
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let scope = cancel.child_token();
    let (mut a_read, mut a_write) = tokio::io::split(a);
    let (mut b_read, mut b_write) = tokio::io::split(b);

    let result = {
        let a_to_b = pin!(copy_one_way(&mut a_read, &mut b_write, &scope, buffer_size));
        let b_to_a = pin!(copy_one_way(&mut b_read, &mut a_write, &scope, buffer_size));

        match future::select(a_to_b, b_to_a).await {
            Either::Left((first, sibling)) => {
                scope.cancel();
                log_direction("A->B", &first);
                log_direction("B->A", &sibling.await);
                first
            }
            Either::Right((first, sibling)) => {
                scope.cancel();
                log_direction("B->A", &first);
                log_direction("A->B", &sibling.await);
                first
            }
        }
    };

    shutdown_half("B", &mut b_write).await;
    shutdown_half("A", &mut a_write).await;

    result.map(|_| ())
}

async fn shutdown_half<W>(side: &str, writer: &mut W)
where
    W: AsyncWrite + Unpin,
{
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, writer.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Shutdown of {} failed: {}", side, e),
        Err(_) => debug!("Shutdown of {} timed out", side),
    }
}

/// Copy `reader` into `writer` until end-of-stream, error or cancellation
///
/// Returns the number of bytes copied on a clean end-of-stream.
async fn copy_one_way<R, W>(
    reader: &mut R,
    writer: &mut W,
    scope: &CancellationToken,
    buffer_size: usize,
) -> Result<u64, TunnelError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buffer_size];
    let mut total = 0u64;

    loop {
        if scope.is_cancelled() {
            return Err(TunnelError::Cancelled);
        }

        let n = tokio::select! {
            biased;
            _ = scope.cancelled() => return Err(TunnelError::Cancelled),
            read = reader.read(&mut buf) => read.map_err(TunnelError::relay)?,
        };

        if n == 0 {
            return Ok(total);
        }

        tokio::select! {
            biased;
            _ = scope.cancelled() => return Err(TunnelError::Cancelled),
            written = write_chunk(writer, &buf[..n]) => written.map_err(TunnelError::relay)?,
        }

        total += n as u64;
    }
}

async fn write_chunk<W>(writer: &mut W, chunk: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(chunk).await?;
    writer.flush().await
}

fn log_direction(direction: &str, result: &Result<u64, TunnelError>) {
    match result {
        Ok(bytes) => debug!("{} finished: {} bytes", direction, bytes),
        Err(TunnelError::Cancelled) => debug!("{} cancelled", direction),
        Err(e) => debug!("{} error: {}", direction, e),
    }
}
