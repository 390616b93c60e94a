use crate::reporting::ReporterSelection;
use http::header::{HeaderName, HeaderValue};
use http::Uri;
use serde::Deserialize;
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_OUT_FILE: &str = "/dev/null";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings as they appear in the TOML file; the CLI produces the same shape
/// and wins wherever it sets a value.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub uri: Option<String>,
    pub out_file: Option<String>,
    pub reporters: Option<Vec<String>>,
    pub no_cache: Option<bool>,
    pub headers: Option<Vec<String>>,
    pub json: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<FileConfig, ConfigError> {
        let path = path.as_ref();
        let read_err = |source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut f = File::open(path).map_err(read_err)?;
        let mut contents = String::new();
        f.read_to_string(&mut contents).map_err(read_err)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Values set in `overrides` replace ours.
    pub fn merge(self, overrides: FileConfig) -> FileConfig {
        FileConfig {
            uri: overrides.uri.or(self.uri),
            out_file: overrides.out_file.or(self.out_file),
            reporters: overrides.reporters.or(self.reporters),
            no_cache: overrides.no_cache.or(self.no_cache),
            headers: match (self.headers, overrides.headers) {
                (Some(mut base), Some(extra)) => {
                    base.extend(extra);
                    Some(base)
                }
                (base, extra) => extra.or(base),
            },
            json: overrides.json.or(self.json),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
        }
    }

    pub fn reporter_selection(&self) -> ReporterSelection {
        ReporterSelection::from_names(self.reporters.clone().unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub uri: Uri,
    pub out_file: PathBuf,
    pub reporters: ReporterSelection,
    pub no_cache: bool,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub json: Option<PathBuf>,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("No URI specified")]
    MissingUri,
    #[error("Invalid URI '{0}': {1}")]
    InvalidUri(String, http::uri::InvalidUri),
    #[error("Currently, only http:// and https:// URIs are supported, not '{0}'")]
    UnsupportedScheme(String),
    #[error("Invalid header '{0}', expected 'Name: value'")]
    InvalidHeader(String),
}

fn parse_header(line: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let invalid = || ConfigError::InvalidHeader(line.to_string());
    let (name, value) = line.split_once(':').ok_or_else(invalid)?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((name, value))
}

fn parse_uri(raw: &str) -> Result<Uri, ConfigError> {
    let uri = raw
        .parse::<Uri>()
        .map_err(|e| ConfigError::InvalidUri(raw.to_string(), e))?;
    match uri.scheme_str().map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("http") | Some("https") if uri.host().is_some() => Ok(uri),
        _ => Err(ConfigError::UnsupportedScheme(raw.to_string())),
    }
}

impl Config {
    pub fn fill_defaults(unresolved: FileConfig) -> Result<Config, ConfigError> {
        let reporters = unresolved.reporter_selection();
        let uri = parse_uri(unresolved.uri.as_deref().ok_or(ConfigError::MissingUri)?)?;
        let headers = unresolved
            .headers
            .unwrap_or_default()
            .iter()
            .map(|h| parse_header(h))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Config {
            uri,
            out_file: unresolved
                .out_file
                .unwrap_or_else(|| DEFAULT_OUT_FILE.into())
                .into(),
            reporters,
            no_cache: unresolved.no_cache.unwrap_or(false),
            headers,
            json: unresolved.json.map(PathBuf::from),
            timeout: Duration::from_secs(unresolved.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}
