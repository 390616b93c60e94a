use crate::config::Config;
use crate::interrupt::Interrupted;
use crate::reporting::TransferSummary;
use bytes::Bytes;
use http::header::{CACHE_CONTROL, EXPIRES, PRAGMA, USER_AGENT};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Empty};
use sha2::{Digest, Sha256};
use slog::{debug, info, o, warn, Logger};
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracer_client::{Client, ClientError};
use tracer_trace::{Headers, Timestamp, Trace, TraceCollector};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Could not build request for {uri}: {source}")]
    Request { uri: String, source: http::Error },
    #[error("Could not open {}: {source}", path.display())]
    Output { path: PathBuf, source: io::Error },
    #[error("Could not write to {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Request for {uri} failed: {source}")]
    Client { uri: String, source: ClientError },
    #[error("Transfer from {uri} failed: {source}")]
    Body { uri: String, source: hyper::Error },
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result of one traced fetch.
#[derive(Debug)]
pub struct Fetched {
    pub trace: Trace,
    pub status: StatusCode,
    pub body_hash: String,
    /// The transfer was cut short by the user; the trace covers what arrived.
    pub interrupted: bool,
}

impl fmt::Display for Fetched {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Response {}, body sha256 {}", self.status, self.body_hash)?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}

pub struct FetchExecutor {
    config: Config,
    logger: Logger,
}

impl FetchExecutor {
    pub fn new(config: Config, logger: Logger) -> FetchExecutor {
        FetchExecutor { config, logger }
    }

    fn build_request(&self) -> Result<Request<Empty<Bytes>>, FetchError> {
        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(self.config.uri.clone());
        if !self.config.headers.iter().any(|(k, _)| *k == USER_AGENT) {
            builder = builder.header(USER_AGENT, concat!("tracer/", env!("CARGO_PKG_VERSION")));
        }
        for (k, v) in self.config.headers.iter() {
            builder = builder.header(k, v);
        }
        if self.config.no_cache {
            info!(self.logger, "Requesting that content not come from cache");
            builder = builder
                .header(PRAGMA, "no-cache")
                .header(CACHE_CONTROL, "no-cache")
                .header(CACHE_CONTROL, "no-store")
                .header(CACHE_CONTROL, "must-revalidate")
                .header(EXPIRES, "0");
        }
        builder
            .body(Empty::new())
            .map_err(|source| FetchError::Request {
                uri: self.config.uri.to_string(),
                source,
            })
    }

    /// Performs the fetch under the configured timeout and freezes the trace.
    pub async fn execute(&self, interrupted: &Interrupted) -> Result<Fetched, FetchError> {
        info!(self.logger, "Downloading '{}'", self.config.uri);
        let path = &self.config.out_file;
        let mut out = File::create(path)
            .await
            .map_err(|source| FetchError::Output {
                path: path.clone(),
                source,
            })?;

        let req = self.build_request()?;
        let mut collector =
            TraceCollector::new(self.logger.new(o!("uri" => self.config.uri.to_string())));
        collector.set_request_headers(Headers::from(req.headers()));
        let client = Client::new(collector.handle(), self.logger.clone()).map_err(|source| {
            FetchError::Client {
                uri: self.config.uri.to_string(),
                source,
            }
        })?;

        let transfer = self.transfer(&client, req, &mut collector, &mut out, interrupted);
        let (status, body_hash, stopped) =
            match tokio::time::timeout(self.config.timeout, transfer).await {
                Ok(r) => r?,
                Err(_) => return Err(FetchError::Timeout(self.config.timeout)),
            };
        out.flush().await.map_err(|source| FetchError::Write {
            path: path.clone(),
            source,
        })?;

        let trace = collector.finish(Timestamp::now());
        info!(self.logger, "{}", TransferSummary::new(&trace));
        Ok(Fetched {
            trace,
            status,
            body_hash,
            interrupted: stopped,
        })
    }

    async fn transfer(
        &self,
        client: &Client,
        req: Request<Empty<Bytes>>,
        collector: &mut TraceCollector,
        out: &mut File,
        interrupted: &Interrupted,
    ) -> Result<(StatusCode, String, bool), FetchError> {
        let uri = self.config.uri.to_string();
        let res = client
            .request(req)
            .await
            .map_err(|source| FetchError::Client {
                uri: uri.clone(),
                source,
            })?;
        // Hooks up to the first byte have all fired by now.
        collector.process_outstanding();
        collector.set_response_headers(Headers::from(res.headers()));
        let status = res.status();

        info!(
            self.logger,
            "Writing retrieved data to '{}'",
            self.config.out_file.display()
        );
        collector.begin_transfer(Timestamp::now());
        let mut hasher = Sha256::new();
        let mut body = res.into_body();
        let mut stopped = false;
        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(|source| FetchError::Body {
                uri: uri.clone(),
                source,
            })?;
            if let Ok(data) = frame.into_data() {
                out.write_all(&data)
                    .await
                    .map_err(|source| FetchError::Write {
                        path: self.config.out_file.clone(),
                        source,
                    })?;
                hasher.update(&data);
                collector.write_all(&data)?;
            }
            if interrupted.interrupted() {
                warn!(self.logger, "Transfer interrupted, keeping partial trace");
                stopped = true;
                break;
            }
        }
        debug!(self.logger, "Body complete"; "status" => status.as_u16());
        Ok((status, format!("{:x}", hasher.finalize()), stopped))
    }
}
