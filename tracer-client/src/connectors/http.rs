use super::host_port;
use crate::dns::TracingResolver;
use crate::error::ClientError;
use hyper::Uri;
use slog::{debug, Logger};
use tokio::net::TcpStream;
use tracer_trace::TraceHandle;

const NETWORK: &str = "tcp";

/// Resolves and dials the TCP connection for a URI, firing the connect hooks
/// around every attempt.
#[derive(Clone)]
pub struct TracingConnector {
    resolver: TracingResolver,
    handle: TraceHandle,
    logger: Logger,
    nodelay: bool,
}

impl TracingConnector {
    pub fn new(handle: TraceHandle, logger: Logger) -> TracingConnector {
        let resolver = TracingResolver::new(handle.clone(), logger.clone());
        TracingConnector {
            resolver,
            handle,
            logger,
            nodelay: false,
        }
    }

    pub fn set_nodelay(&mut self, nodelay: bool) {
        self.nodelay = nodelay;
    }

    /// Tries each resolved address in order; the first that connects wins.
    pub async fn connect(&self, dst: &Uri) -> Result<TcpStream, ClientError> {
        let (host, port) = host_port(dst)?;
        let addrs = self.resolver.resolve(&host, port).await?;
        let mut last_err = None;
        for addr in addrs {
            let addr_str = addr.to_string();
            self.handle.connect_start(NETWORK, addr_str.as_str());
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    self.handle.connect_done(NETWORK, addr_str, None);
                    stream.set_nodelay(self.nodelay)?;
                    return Ok(stream);
                }
                Err(e) => {
                    debug!(self.logger, "Connecting to {} failed: {}", addr_str, e);
                    self.handle
                        .connect_done(NETWORK, addr_str.as_str(), Some(e.to_string()));
                    last_err = Some(ClientError::Connect {
                        addr: addr_str,
                        source: e,
                    });
                }
            }
        }
        Err(last_err.unwrap_or(ClientError::NoAddress(host)))
    }
}
