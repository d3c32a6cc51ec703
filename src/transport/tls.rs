//! TLS acceptor implementation
//!
//! Terminates TLS using rustls (pure Rust, easy static linking) with a
//! certificate chain and private key loaded from PEM files.

use super::{Acceptor, SocketOpts};
use crate::config::{TlsConfig, TransportConfig};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::io::BufReader;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;

/// TLS stream type alias
pub type TlsStream = tokio_rustls::server::TlsStream<TcpStream>;

/// ALPN protocol offered to clients; the WebSocket upgrade needs HTTP/1.1
const ALPN_HTTP11: &[u8] = b"http/1.1";

/// TLS acceptor for encrypted inbound connections
#[derive(Clone)]
pub struct TlsAcceptor {
    acceptor: tokio_rustls::TlsAcceptor,
    socket_opts: SocketOpts,
}

impl std::fmt::Debug for TlsAcceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsAcceptor")
            .field("socket_opts", &self.socket_opts)
            .finish()
    }
}

impl TlsAcceptor {
    /// Create a new TLS acceptor from certificate and key files
    pub fn with_config(config: &TlsConfig, socket_opts: SocketOpts) -> Result<Self> {
        let certs = load_certs(&config.cert).context("Failed to load TLS certificate")?;
        let key = load_private_key(&config.key).context("Failed to load TLS private key")?;

        let mut tls_config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .context("Failed to build TLS server config")?;
        tls_config.alpn_protocols = vec![ALPN_HTTP11.to_vec()];

        tracing::info!("TLS enabled with cert: {}", config.cert);

        Ok(TlsAcceptor {
            acceptor: tokio_rustls::TlsAcceptor::from(Arc::new(tls_config)),
            socket_opts,
        })
    }
}

#[async_trait]
impl Acceptor for TlsAcceptor {
    type Stream = TlsStream;

    fn new(config: &TransportConfig) -> Result<Self> {
        let tls = config
            .tls
            .as_ref()
            .ok_or_else(|| anyhow!("TLS transport requires a [server.transport.tls] section"))?;
        Self::with_config(tls, SocketOpts::from_tcp_config(&config.tcp))
    }

    async fn accept(&self, conn: TcpStream) -> Result<Self::Stream> {
        Self::hint(&conn, &self.socket_opts);
        self.acceptor
            .accept(conn)
            .await
            .with_context(|| "TLS handshake failed")
    }
}

/// Load TLS certificate chain from PEM file
fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open certificate file: {}", path))?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse certificates from: {}", path))?;
    if certs.is_empty() {
        return Err(anyhow!("No certificates found in {}", path));
    }
    tracing::debug!("Loaded {} certificate(s) from {}", certs.len(), path);
    Ok(certs)
}

/// Load TLS private key from PEM file
fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>> {
    let file =
        std::fs::File::open(path).with_context(|| format!("Failed to open key file: {}", path))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .with_context(|| format!("Failed to parse private key from: {}", path))?
        .ok_or_else(|| anyhow!("No private key found in {}", path))
}
