//! TCP transport, with TLS when the relay is reached on port 443

use super::Transport;
use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use rustls::pki_types::ServerName;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

const INITIAL_BUF_CAPACITY: usize = 4 * 1024;

/// Default cap on a single relay response
pub const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// TLS settings for a secure relay endpoint
struct TlsSettings {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

/// Transport that opens a fresh connection per request
pub struct TcpTransport {
    host: String,
    port: u16,
    timeout: Duration,
    max_response_bytes: usize,
    tls: Option<TlsSettings>,
}

impl TcpTransport {
    /// Build a transport for the configured endpoint
    ///
    /// Port 443 selects TLS, verified against the webpki root set.
    pub fn new(config: &RelayConfig) -> Result<Self> {
        config.validate()?;

        let tls = if config.is_secure() {
            let server_name = ServerName::try_from(config.host.clone()).map_err(|e| {
                RelayError::Config(format!("invalid TLS server name '{}': {}", config.host, e))
            })?;
            Some(TlsSettings {
                connector: build_tls_connector()?,
                server_name,
            })
        } else {
            None
        };

        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            timeout: config.timeout(),
            max_response_bytes: MAX_RESPONSE_BYTES,
            tls,
        })
    }

    /// Override the response size cap
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    pub fn is_secure(&self) -> bool {
        self.tls.is_some()
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn exchange(&self, request: &[u8]) -> Result<Bytes> {
        let tcp = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| RelayError::Connection(format!("{}: {}", self.address(), e)))?;

        match &self.tls {
            Some(tls) => {
                let mut stream = tls
                    .connector
                    .connect(tls.server_name.clone(), tcp)
                    .await
                    .map_err(|e| {
                        RelayError::Connection(format!(
                            "TLS handshake with {} failed: {}",
                            self.address(),
                            e
                        ))
                    })?;
                round_trip(&mut stream, request, self.max_response_bytes).await
            }
            None => {
                let mut stream = tcp;
                round_trip(&mut stream, request, self.max_response_bytes).await
            }
        }
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("tls", &self.tls.is_some())
            .finish()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, request: &[u8]) -> Result<Bytes> {
        tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| {
                RelayError::Timeout(format!(
                    "request to {} exceeded {}s",
                    self.address(),
                    self.timeout.as_secs()
                ))
            })?
    }

    fn name(&self) -> &str {
        if self.tls.is_some() {
            "tls"
        } else {
            "tcp"
        }
    }
}

/// Write the request, half-close, and read until the peer closes
///
/// Gives up with `ResponseTooLarge` once more than `limit` bytes arrive.
async fn round_trip<S>(stream: &mut S, request: &[u8], limit: usize) -> Result<Bytes>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(request)
        .await
        .map_err(|e| RelayError::Transport(format!("write failed: {}", e)))?;
    stream
        .shutdown()
        .await
        .map_err(|e| RelayError::Transport(format!("shutdown failed: {}", e)))?;

    let mut buf = BytesMut::with_capacity(INITIAL_BUF_CAPACITY);
    loop {
        match stream.read_buf(&mut buf).await {
            Ok(0) => break,
            Ok(_) if buf.len() > limit => {
                tracing::warn!(bytes = buf.len(), limit, "Relay response exceeds size cap");
                return Err(RelayError::ResponseTooLarge { limit });
            }
            Ok(_) => {}
            // TLS peers often close without close_notify once the reply is out
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                tracing::warn!(bytes = buf.len(), "Relay closed connection without close_notify");
                break;
            }
            Err(e) => return Err(RelayError::Transport(format!("read failed: {}", e))),
        }
    }

    Ok(buf.freeze())
}

fn build_tls_connector() -> Result<TlsConnector> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| RelayError::Config(format!("TLS setup failed: {}", e)))?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}
