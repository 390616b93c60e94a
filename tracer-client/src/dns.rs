use crate::error::ClientError;
use slog::{debug, Logger};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use tracer_trace::TraceHandle;

/// Resolves host names on the blocking pool, firing the DNS hooks around the
/// lookup. Address literals are returned as-is and fire nothing.
#[derive(Clone)]
pub struct TracingResolver {
    handle: TraceHandle,
    logger: Logger,
}

impl TracingResolver {
    pub fn new(handle: TraceHandle, logger: Logger) -> TracingResolver {
        TracingResolver { handle, logger }
    }

    pub async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, ClientError> {
        if let Some(addr) = try_parse_ipaddr(host) {
            debug!(self.logger, "'{}' is an address literal, skipping DNS", host);
            return Ok(vec![SocketAddr::new(addr, port)]);
        }
        let handle = self.handle.clone();
        let name = host.to_string();
        tokio::task::spawn_blocking(move || {
            handle.dns_start(name.as_str());
            let resolved = resolve(&name, port);
            let ips = match resolved {
                Ok(ref addrs) => addrs.iter().map(|a| a.ip()).collect(),
                Err(_) => Vec::new(),
            };
            handle.dns_done(ips);
            resolved.map_err(|source| ClientError::Dns { host: name, source })
        })
        .await
        .map_err(|e| ClientError::Io(e.into()))?
    }
}

fn try_parse_ipaddr(host: &str) -> Option<IpAddr> {
    // Bracketed IPv6 literals come straight out of the URI authority.
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        Some(IpAddr::V4(addr))
    } else if let Ok(addr) = host.parse::<Ipv6Addr>() {
        Some(IpAddr::V6(addr))
    } else {
        None
    }
}

fn resolve(name: &str, port: u16) -> Result<Vec<SocketAddr>, std::io::Error> {
    (name, port).to_socket_addrs().map(|sockets| sockets.collect())
}
