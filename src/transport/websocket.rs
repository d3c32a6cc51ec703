//! WebSocket session channel
//!
//! Each accepted WebSocket carries exactly one tunnel session. Binary
//! messages are the chunks of the session; a Close frame (or an empty
//! binary message) ends the inbound side. Text, ping and pong messages
//! carry no session data and are skipped.

use crate::error::HunkRelayError;
use crate::stream::{session_endpoint, Hunk, SessionStream};
use bytes::Bytes;
use futures::{future, SinkExt, StreamExt, TryStreamExt};
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

/// Run the server side of the WebSocket upgrade
///
/// Requests for any path other than `path` are answered with 404.
pub async fn accept_websocket<S>(stream: S, path: &str) -> Result<WebSocketStream<S>, HunkRelayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let expected = path.to_string();
    let check_path = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        if req.uri().path() == expected {
            return Ok(resp);
        }
        tracing::debug!("Rejecting upgrade for path {}", req.uri().path());
        let mut err = ErrorResponse::new(Some("Not Found".to_string()));
        *err.status_mut() = StatusCode::NOT_FOUND;
        Err(err)
    };

    tokio_tungstenite::accept_hdr_async(stream, check_path)
        .await
        .map_err(|e| HunkRelayError::Transport(format!("WebSocket handshake failed: {}", e)))
}

/// Turn an accepted WebSocket into the byte-stream endpoint of its session
pub fn websocket_endpoint<S>(ws: WebSocketStream<S>, cancel: CancellationToken) -> SessionStream
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sink, source) = ws.split();

    let source = source
        .map_err(io::Error::other)
        .try_filter_map(|msg| future::ready(Ok(message_to_hunk(msg))));

    let sink = sink
        .sink_map_err(io::Error::other)
        .with(|chunk: Bytes| future::ready(Ok::<_, io::Error>(Message::Binary(chunk.to_vec()))));

    session_endpoint(source, sink, cancel)
}

/// Map one inbound message to a fetch, or `None` when it carries no data
fn message_to_hunk(msg: Message) -> Option<Hunk> {
    match msg {
        Message::Binary(data) => Some(Hunk::from(data)),
        Message::Close(_) => Some(Hunk::Multi(Vec::new())),
        Message::Text(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}
