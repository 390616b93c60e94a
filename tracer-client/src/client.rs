use crate::connectors::{host_port, TracingHttpsConnector};
use crate::error::ClientError;
use crate::stream::TracingStream;
use bytes::Bytes;
use http::header::{HeaderValue, HOST};
use http::uri::PathAndQuery;
use http::{Request, Response, Uri};
use http_body_util::Empty;
use hyper::body::Incoming;
use hyper_util::rt::TokioIo;
use slog::{debug, o, Logger};
use tracer_trace::TraceHandle;

/// Performs a single HTTP/1.1 exchange on a fresh connection, reporting every
/// lifecycle hook to a `TraceHandle`.
pub struct Client {
    connector: TracingHttpsConnector,
    handle: TraceHandle,
    logger: Logger,
}

impl Client {
    pub fn new(handle: TraceHandle, logger: Logger) -> Result<Client, ClientError> {
        let connector = TracingHttpsConnector::new(true, handle.clone(), logger.clone())?;
        Ok(Client::from_connector(connector, handle, logger))
    }

    pub fn from_connector(
        connector: TracingHttpsConnector,
        handle: TraceHandle,
        logger: Logger,
    ) -> Client {
        Client {
            connector,
            handle,
            logger: logger.new(o!("component" => "client")),
        }
    }

    /// Connects, sends `req` and resolves once the response head is in.
    ///
    /// The body is left unread; the connection is driven on a spawned task
    /// until the caller has consumed it.
    pub async fn request(
        &self,
        mut req: Request<Empty<Bytes>>,
    ) -> Result<Response<Incoming>, ClientError> {
        let uri = req.uri().clone();
        let (host, port) = host_port(&uri)?;
        self.handle.session_start(format!("{}:{}", host, port));

        let transport = self.connector.connect(&uri).await?;
        let (local, remote) = transport.endpoints()?;
        self.handle.session_acquired(local, remote);

        into_origin_form(&mut req, &uri)?;
        let io = TokioIo::new(TracingStream::new(transport, self.handle.clone()));
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
        let logger = self.logger.clone();
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(logger, "Connection closed: {}", e);
            }
        });

        let res = sender.send_request(req).await?;
        debug!(self.logger, "Response {} from {}", res.status(), remote);
        Ok(res)
    }
}

/// Rewrites an absolute request URI to `path?query` and sets `Host`, since
/// the connection-level client sends the request line verbatim.
fn into_origin_form<B>(req: &mut Request<B>, uri: &Uri) -> Result<(), ClientError> {
    if !req.headers().contains_key(HOST) {
        let authority = match (uri.host(), uri.port()) {
            (Some(h), Some(p)) => format!("{}:{}", h, p),
            (Some(h), None) => h.to_string(),
            (None, _) => return Err(ClientError::InvalidHost(uri.to_string())),
        };
        let value = HeaderValue::from_str(&authority)
            .map_err(|_| ClientError::InvalidHost(uri.to_string()))?;
        req.headers_mut().insert(HOST, value);
    }
    let pq = uri
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));
    *req.uri_mut() = Uri::from(pq);
    Ok(())
}
