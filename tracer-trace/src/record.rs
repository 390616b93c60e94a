use crate::headers::Headers;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// Name lookup before connecting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dns {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub host: Option<String>,
    pub addrs: Vec<IpAddr>,
}

/// The TCP portion of connection setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub protocol: Option<String>,
    pub address: Option<String>,
    pub error: Option<String>,
}

/// The TLS handshake, for https only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tls {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub version: Option<u16>,
    pub cipher_suite: Option<u16>,
    pub server_name: Option<String>,
}

impl Tls {
    /// Human readable protocol version, falling back to the hex wire value.
    pub fn version_name(&self) -> Option<String> {
        self.version.map(|v| match v {
            0x0300 => "SSL 3.0".to_string(),
            0x0301 => "TLS 1.0".to_string(),
            0x0302 => "TLS 1.1".to_string(),
            0x0303 => "TLS 1.2".to_string(),
            0x0304 => "TLS 1.3".to_string(),
            other => format!("{:x}", other),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub local: SocketAddr,
    pub remote: SocketAddr,
}

/// All pre-transfer work (DNS, TCP, TLS) up to a usable connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub host_port: Option<String>,
    pub endpoints: Option<Endpoints>,
}

impl Session {
    pub fn local(&self) -> Option<SocketAddr> {
        self.endpoints.map(|e| e.local)
    }

    pub fn remote(&self) -> Option<SocketAddr> {
        self.endpoints.map(|e| e.remote)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub start: Option<Timestamp>,
    pub error: Option<String>,
}

/// Body byte accounting with a second-granularity history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub total_bytes: u64,
    pub current_second: Option<u64>,
    pub current_second_bytes: u64,
    pub per_second: Vec<u64>,
}

/// Everything observed about one request/response exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub dns: Dns,
    pub connection: Connection,
    pub tls: Tls,
    pub session: Session,
    pub request: Request,
    pub first_byte: Option<Timestamp>,
    pub transfer: Transfer,
    pub request_headers: Headers,
    pub response_headers: Headers,
}
