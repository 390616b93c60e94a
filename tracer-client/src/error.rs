use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid host in '{0}'")]
    InvalidHost(String),
    #[error("Unsupported scheme in '{0}', only http and https are supported")]
    UnsupportedScheme(String),
    #[error("Did not resolve an address for '{0}'")]
    NoAddress(String),
    #[error("DNS lookup for '{host}' failed: {source}")]
    Dns { host: String, source: io::Error },
    #[error("Connection to {addr} failed: {source}")]
    Connect { addr: String, source: io::Error },
    #[error("TLS configuration failed: {0}")]
    TlsConfig(#[from] rustls::Error),
    #[error("TLS handshake with '{host}' failed: {source}")]
    Tls { host: String, source: io::Error },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Http(#[from] http::Error),
    #[error(transparent)]
    Hyper(#[from] hyper::Error),
}
