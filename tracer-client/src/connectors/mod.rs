mod http;
mod https;

pub use self::http::TracingConnector;
pub use self::https::{Transport, TracingHttpsConnector};

use crate::error::ClientError;
use hyper::Uri;

/// Host and port to dial for `uri`, with the scheme's default port.
pub(crate) fn host_port(uri: &Uri) -> Result<(String, u16), ClientError> {
    let host = uri
        .host()
        .ok_or_else(|| ClientError::InvalidHost(uri.to_string()))?;
    let port = match uri.port_u16() {
        Some(p) => p,
        None => match uri.scheme_str() {
            Some("https") => 443,
            Some("http") => 80,
            _ => return Err(ClientError::UnsupportedScheme(uri.to_string())),
        },
    };
    Ok((host.to_string(), port))
}

pub(crate) fn is_https(uri: &Uri) -> bool {
    uri.scheme_str() == Some("https")
}
