//! End-to-end tunnel sessions against real loopback targets

mod common;

use bytes::Bytes;
use common::{create_test_listener, handshake_mock, spawn_echo_target, TestConfigBuilder};
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use hunkrelay::config::TunnelConfig;
use hunkrelay::error::TunnelError;
use hunkrelay::server::Server;
use hunkrelay::stream::{session_endpoint, Hunk};
use hunkrelay::transport::TcpAcceptor;
use hunkrelay::tunnel::{TcpDialer, TunnelHandler};
use std::io;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

type Inbound = mpsc::Sender<io::Result<Hunk>>;
type Outbound = mpsc::Receiver<Bytes>;

/// Start a session over in-memory channels and return its client ends
fn spawn_channel_session(
    config: TunnelConfig,
    cancel: CancellationToken,
) -> (Inbound, Outbound, JoinHandle<Result<(), TunnelError>>) {
    let (in_tx, in_rx) = mpsc::channel::<io::Result<Hunk>>(16);
    let (out_tx, out_rx) = mpsc::channel::<Bytes>(16);
    let sink = out_tx.sink_map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e));

    let handler = TunnelHandler::with_tcp_dialer(&config, TcpDialer::default());
    let task = tokio::spawn(async move {
        let endpoint = session_endpoint(in_rx, sink, cancel.clone());
        handler.handle(endpoint, &cancel).await
    });
    (in_tx, out_rx, task)
}

async fn collect_outbound(out_rx: &mut Outbound, len: usize) -> Vec<u8> {
    let mut received = Vec::new();
    while received.len() < len {
        let chunk = out_rx.next().await.unwrap();
        received.extend_from_slice(&chunk);
    }
    received
}

#[tokio::test]
async fn test_channel_session_echo() {
    let (target, _echo) = spawn_echo_target().await;
    let (mut in_tx, mut out_rx, task) =
        spawn_channel_session(TunnelConfig::default(), CancellationToken::new());

    let mut first = handshake_mock::create_connect_ipv4([127, 0, 0, 1], target.port());
    first.extend_from_slice(b"hello");
    in_tx.send(Ok(Hunk::from(first))).await.unwrap();
    assert_eq!(collect_outbound(&mut out_rx, 5).await, b"hello");

    in_tx
        .send(Ok(Hunk::Multi(vec![
            Bytes::from_static(b" tun"),
            Bytes::new(),
            Bytes::from_static(b"nel"),
        ])))
        .await
        .unwrap();
    assert_eq!(collect_outbound(&mut out_rx, 7).await, b" tunnel");

    drop(in_tx);
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_channel_session_handshake_split_across_chunks() {
    let (target, _echo) = spawn_echo_target().await;
    let (mut in_tx, mut out_rx, task) =
        spawn_channel_session(TunnelConfig::default(), CancellationToken::new());

    let handshake = handshake_mock::create_connect_ipv4([127, 0, 0, 1], target.port());
    for piece in handshake.chunks(7) {
        in_tx.send(Ok(Hunk::from(piece.to_vec()))).await.unwrap();
    }
    in_tx.send(Ok(Hunk::from(b"ok".to_vec()))).await.unwrap();
    assert_eq!(collect_outbound(&mut out_rx, 2).await, b"ok");

    drop(in_tx);
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_channel_session_large_transfer_small_buffer() {
    let (target, _echo) = spawn_echo_target().await;
    let config = TunnelConfig {
        relay_buffer_size: 64,
        ..Default::default()
    };
    let (mut in_tx, mut out_rx, task) = spawn_channel_session(config, CancellationToken::new());

    let payload: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
    in_tx
        .send(Ok(Hunk::from(handshake_mock::create_connect_ipv4(
            [127, 0, 0, 1],
            target.port(),
        ))))
        .await
        .unwrap();

    let sender = tokio::spawn({
        let payload = payload.clone();
        async move {
            for piece in payload.chunks(1000) {
                in_tx.send(Ok(Hunk::from(piece.to_vec()))).await.unwrap();
            }
            in_tx
        }
    });

    let received = collect_outbound(&mut out_rx, payload.len()).await;
    assert_eq!(received, payload);

    drop(sender.await.unwrap());
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_channel_session_dial_refused() {
    let (listener, addr) = create_test_listener().await;
    drop(listener);

    let (mut in_tx, _out_rx, task) =
        spawn_channel_session(TunnelConfig::default(), CancellationToken::new());
    in_tx
        .send(Ok(Hunk::from(handshake_mock::create_connect_ipv4(
            [127, 0, 0, 1],
            addr.port(),
        ))))
        .await
        .unwrap();

    match task.await.unwrap() {
        Err(TunnelError::Dial { target, .. }) => assert_eq!(target, addr.to_string()),
        other => panic!("expected dial error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_channel_session_empty_domain_fails_at_dial() {
    let (mut in_tx, _out_rx, task) =
        spawn_channel_session(TunnelConfig::default(), CancellationToken::new());
    in_tx
        .send(Ok(Hunk::from(handshake_mock::create_connect_domain("", 80))))
        .await
        .unwrap();

    match task.await.unwrap() {
        Err(TunnelError::Dial { target, .. }) => assert_eq!(target, ":80"),
        other => panic!("expected dial error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_channel_session_udp_rejected() {
    let (mut in_tx, _out_rx, task) =
        spawn_channel_session(TunnelConfig::default(), CancellationToken::new());
    in_tx
        .send(Ok(Hunk::from(handshake_mock::create_udp_associate())))
        .await
        .unwrap();

    assert!(matches!(
        task.await.unwrap(),
        Err(TunnelError::UdpNotSupported)
    ));
}

#[tokio::test]
async fn test_channel_session_cancelled_while_relaying() {
    let (target, _echo) = spawn_echo_target().await;
    let cancel = CancellationToken::new();
    let (mut in_tx, mut out_rx, task) =
        spawn_channel_session(TunnelConfig::default(), cancel.clone());

    let mut first = handshake_mock::create_connect_ipv4([127, 0, 0, 1], target.port());
    first.extend_from_slice(b"ping");
    in_tx.send(Ok(Hunk::from(first))).await.unwrap();
    assert_eq!(collect_outbound(&mut out_rx, 4).await, b"ping");

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(TunnelError::Cancelled)));
    drop(in_tx);
}

#[tokio::test]
async fn test_channel_session_inbound_error() {
    let (mut in_tx, _out_rx, task) =
        spawn_channel_session(TunnelConfig::default(), CancellationToken::new());
    in_tx
        .send(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")))
        .await
        .unwrap();

    match task.await.unwrap() {
        Err(TunnelError::Handshake { step, source }) => {
            assert_eq!(step, "credential");
            assert_eq!(source.kind(), io::ErrorKind::ConnectionReset);
        }
        other => panic!("expected handshake error, got {:?}", other),
    }
}

async fn start_server(
    config: hunkrelay::config::ServerConfig,
) -> (std::net::SocketAddr, broadcast::Sender<bool>, JoinHandle<anyhow::Result<()>>) {
    let server = Server::<TcpAcceptor>::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(server.run(shutdown_rx));
    (addr, shutdown_tx, task)
}

#[tokio::test]
async fn test_websocket_session_echo() {
    let (target, _echo) = spawn_echo_target().await;
    let (addr, shutdown_tx, server) = start_server(TestConfigBuilder::new().build()).await;

    let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{}/tunnel", addr))
        .await
        .unwrap();

    let mut first = handshake_mock::create_connect_ipv4([127, 0, 0, 1], target.port());
    first.extend_from_slice(b"over websocket");
    client.send(Message::Binary(first)).await.unwrap();

    let mut received = Vec::new();
    while received.len() < 14 {
        match client.next().await.unwrap().unwrap() {
            Message::Binary(data) => received.extend_from_slice(&data),
            other => panic!("unexpected message: {:?}", other),
        }
    }
    assert_eq!(received, b"over websocket");

    client.send(Message::Close(None)).await.unwrap();
    drop(client);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_websocket_domain_target() {
    let (target, _echo) = spawn_echo_target().await;
    let (addr, shutdown_tx, server) = start_server(TestConfigBuilder::new().build()).await;

    let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{}/tunnel", addr))
        .await
        .unwrap();

    let mut first = handshake_mock::create_connect_domain("localhost", target.port());
    first.extend_from_slice(b"named");
    client.send(Message::Binary(first)).await.unwrap();

    match client.next().await.unwrap().unwrap() {
        Message::Binary(data) => assert_eq!(data, b"named"),
        other => panic!("unexpected message: {:?}", other),
    }

    drop(client);
    shutdown_tx.send(true).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_websocket_wrong_path_rejected() {
    let (addr, shutdown_tx, server) = start_server(TestConfigBuilder::new().build()).await;

    let result = tokio_tungstenite::connect_async(format!("ws://{}/elsewhere", addr)).await;
    assert!(result.is_err());

    shutdown_tx.send(true).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_cancels_active_sessions() {
    let (target, _echo) = spawn_echo_target().await;
    let (addr, shutdown_tx, server) = start_server(TestConfigBuilder::new().build()).await;

    let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{}/tunnel", addr))
        .await
        .unwrap();
    let mut first = handshake_mock::create_connect_ipv4([127, 0, 0, 1], target.port());
    first.extend_from_slice(b"x");
    client.send(Message::Binary(first)).await.unwrap();
    assert!(matches!(
        client.next().await.unwrap().unwrap(),
        Message::Binary(_)
    ));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    // The session's write side was shut down, so the client sees the close.
    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(Ok(msg)) = client.next().await {
            if msg.is_close() {
                break;
            }
        }
    })
    .await;
    assert!(drained.is_ok());
}
