use super::http::TracingConnector;
use super::{host_port, is_https};
use crate::error::ClientError;
use hyper::Uri;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use slog::{debug, Logger};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracer_trace::TraceHandle;

/// An established connection, with or without TLS on top.
pub enum Transport {
    Http(TcpStream),
    Https(Box<TlsStream<TcpStream>>),
}

impl Transport {
    fn tcp(&self) -> &TcpStream {
        match self {
            Transport::Http(s) => s,
            Transport::Https(s) => s.get_ref().0,
        }
    }

    /// Local and remote addresses of the underlying socket.
    pub fn endpoints(&self) -> io::Result<(SocketAddr, SocketAddr)> {
        let tcp = self.tcp();
        Ok((tcp.local_addr()?, tcp.peer_addr()?))
    }
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Http(s) => Pin::new(s).poll_read(cx, buf),
            Transport::Https(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Transport::Http(s) => Pin::new(s).poll_write(cx, buf),
            Transport::Https(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Http(s) => Pin::new(s).poll_flush(cx),
            Transport::Https(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Http(s) => Pin::new(s).poll_shutdown(cx),
            Transport::Https(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// TCP connector with a traced rustls handshake for `https` URIs.
#[derive(Clone)]
pub struct TracingHttpsConnector {
    http: TracingConnector,
    tls_config: Arc<ClientConfig>,
    handle: TraceHandle,
    logger: Logger,
}

/// Client config trusting the webpki roots, speaking HTTP/1.1 only.
pub fn default_tls_config() -> Result<ClientConfig, ClientError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let mut config =
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}

impl TracingHttpsConnector {
    pub fn new(
        nodelay: bool,
        handle: TraceHandle,
        logger: Logger,
    ) -> Result<TracingHttpsConnector, ClientError> {
        Ok(TracingHttpsConnector::from((
            TracingConnector::new(handle.clone(), logger.clone()),
            default_tls_config()?,
            handle,
            logger,
        ))
        .with_nodelay(nodelay))
    }

    fn with_nodelay(mut self, nodelay: bool) -> TracingHttpsConnector {
        self.http.set_nodelay(nodelay);
        self
    }

    pub async fn connect(&self, dst: &Uri) -> Result<Transport, ClientError> {
        let tcp = self.http.connect(dst).await?;
        if !is_https(dst) {
            return Ok(Transport::Http(tcp));
        }

        let (host, _) = host_port(dst)?;
        let hostname = host.trim_start_matches('[').trim_end_matches(']').to_string();
        let server_name = ServerName::try_from(hostname.clone())
            .map_err(|_| ClientError::InvalidHost(hostname.clone()))?;
        let connector = TlsConnector::from(self.tls_config.clone());

        self.handle.tls_start();
        match connector.connect(server_name, tcp).await {
            Ok(tls) => {
                let (_, session) = tls.get_ref();
                let version = session.protocol_version().map(u16::from);
                let suite = session
                    .negotiated_cipher_suite()
                    .map(|s| u16::from(s.suite()));
                debug!(
                    self.logger,
                    "Negotiated {:?} with {:?}",
                    session.protocol_version(),
                    session.negotiated_cipher_suite().map(|s| s.suite())
                );
                self.handle.tls_done(version, suite, hostname);
                Ok(Transport::Https(Box::new(tls)))
            }
            Err(source) => {
                self.handle.tls_done(None, None, hostname.as_str());
                Err(ClientError::Tls {
                    host: hostname,
                    source,
                })
            }
        }
    }
}

impl From<(TracingConnector, ClientConfig, TraceHandle, Logger)> for TracingHttpsConnector {
    fn from(args: (TracingConnector, ClientConfig, TraceHandle, Logger)) -> TracingHttpsConnector {
        TracingHttpsConnector {
            http: args.0,
            tls_config: Arc::new(args.1),
            handle: args.2,
            logger: args.3,
        }
    }
}
