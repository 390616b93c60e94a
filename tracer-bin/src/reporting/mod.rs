mod connection;
mod headers;
mod ipfs;
mod saturn;
mod statistics;
mod table;

pub use self::connection::ConnectionReporter;
pub use self::headers::HeaderReporter;
pub use self::ipfs::IpfsGwReporter;
pub use self::saturn::SaturnReporter;
pub use self::statistics::TransferSummary;
pub use self::table::Table;

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracer_trace::Trace;

/// Post-processing over a finished trace.
pub trait Reporter: Send + Sync {
    fn title(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn report(&self, trace: &Trace) -> Result<String, ReportError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("Header {0} is not present in response")]
    MissingHeader(&'static str),
    #[error("Could not render report")]
    Format(#[from] fmt::Error),
}

/// Returns the first value of each named response header, or the first
/// header that is missing.
fn require_headers<'a, const N: usize>(
    trace: &'a Trace,
    names: [&'static str; N],
) -> Result<[&'a str; N], ReportError> {
    let headers = &trace.record().response_headers;
    let mut values = [""; N];
    for (value, name) in values.iter_mut().zip(names) {
        *value = headers.first(name).ok_or(ReportError::MissingHeader(name))?;
    }
    Ok(values)
}

fn addr_or_dash<A: fmt::Display>(addr: Option<A>) -> String {
    addr.map(|a| a.to_string()).unwrap_or_else(|| "-".into())
}

/// The fixed catalog of reporters, keyed by case-sensitive name.
pub struct Registry {
    reporters: BTreeMap<&'static str, Box<dyn Reporter>>,
}

impl Registry {
    pub fn builtin() -> Registry {
        let mut reporters: BTreeMap<&'static str, Box<dyn Reporter>> = BTreeMap::new();
        reporters.insert("Connection", Box::new(ConnectionReporter));
        reporters.insert("Header", Box::new(HeaderReporter));
        reporters.insert("IPFSGW", Box::new(IpfsGwReporter));
        reporters.insert("Saturn", Box::new(SaturnReporter));
        Registry { reporters }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Reporter> {
        self.reporters.get(name).map(|r| r.as_ref())
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.reporters.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &dyn Reporter)> + '_ {
        self.reporters.iter().map(|(k, v)| (*k, v.as_ref()))
    }
}

/// What the user asked for with `--reporters`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReporterSelection {
    List,
    Names(Vec<String>),
}

impl ReporterSelection {
    pub fn from_names<I, S>(names: I) -> ReporterSelection
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.len() == 1 && names[0] == "list" {
            ReporterSelection::List
        } else {
            ReporterSelection::Names(names)
        }
    }

}

#[derive(Debug)]
pub enum Outcome {
    Report {
        title: &'static str,
        description: &'static str,
        body: String,
    },
    Failed(ReportError),
    Unknown,
}

/// Runs each named reporter over `trace`, in the order given.
///
/// Every name gets an outcome; a failing or unknown reporter has no effect on
/// the others.
pub fn dispatch<S: AsRef<str>>(
    registry: &Registry,
    trace: &Trace,
    names: &[S],
) -> Vec<(String, Outcome)> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let outcome = match registry.get(name) {
                None => Outcome::Unknown,
                Some(r) => match r.report(trace) {
                    Ok(body) => Outcome::Report {
                        title: r.title(),
                        description: r.description(),
                        body,
                    },
                    Err(error) => Outcome::Failed(error),
                },
            };
            (name.to_string(), outcome)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use tracer_trace::data::TraceRecord;
    use tracer_trace::Headers;

    fn trace_with(response: Vec<(&str, &str)>) -> Trace {
        let mut r = TraceRecord::default();
        r.response_headers = response.into_iter().collect::<Headers>();
        Trace::from(r)
    }

    #[test]
    fn catalog_is_fixed_and_sorted() {
        let reg = Registry::builtin();
        let names: Vec<_> = reg.names().collect();
        assert_eq!(names, vec!["Connection", "Header", "IPFSGW", "Saturn"]);
        assert!(reg.get("connection").is_none());
        assert_eq!(reg.get("Saturn").unwrap().title(), "Saturn CDN");
    }

    #[test]
    fn selection_parsing() {
        assert_eq!(ReporterSelection::from_names(["list"]), ReporterSelection::List);
        assert_eq!(
            ReporterSelection::from_names(["Connection", " Header", ""]),
            ReporterSelection::Names(vec!["Connection".into(), "Header".into()])
        );
        assert_eq!(
            ReporterSelection::from_names(Vec::<String>::new()),
            ReporterSelection::Names(vec![])
        );
        assert_eq!(
            ReporterSelection::from_names(["list", "Header"]),
            ReporterSelection::Names(vec!["list".into(), "Header".into()])
        );
    }

    #[test]
    fn unknown_name_does_not_affect_others() {
        let reg = Registry::builtin();
        let trace = trace_with(vec![]);
        let out = dispatch(&reg, &trace, &["Bogus", "Header", "IPFSGW"]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].0, "Bogus");
        assert!(matches!(out[0].1, Outcome::Unknown));
        assert!(matches!(
            out[1].1,
            Outcome::Report {
                title: "Request and Response Headers",
                ..
            }
        ));
        match &out[2].1 {
            Outcome::Failed(error) => {
                assert_eq!(*error, ReportError::MissingHeader("X-Ipfs-Lb-Pop"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn missing_header_message_names_it() {
        assert_eq!(
            ReportError::MissingHeader("X-Ipfs-Pop").to_string(),
            "Header X-Ipfs-Pop is not present in response"
        );
    }

    #[test]
    fn require_headers_reports_first_missing() {
        let trace = trace_with(vec![("b", "2")]);
        assert_eq!(
            require_headers(&trace, ["A", "B"]),
            Err(ReportError::MissingHeader("A"))
        );
        let trace = trace_with(vec![("a", "1"), ("b", "2"), ("b", "3")]);
        assert_eq!(require_headers(&trace, ["A", "B"]), Ok(["1", "2"]));
    }

    fn first_pop(trace: &Trace) -> Result<&str, ReportError> {
        let [pop] = require_headers(trace, ["X-Ipfs-Pop"])?;
        Ok(pop)
    }

    #[test]
    fn required_values_borrow_from_the_trace() {
        let trace = trace_with(vec![("x-ipfs-pop", "gw-3")]);
        let pop = first_pop(&trace);
        assert_eq!(pop, Ok("gw-3"));
    }
}
