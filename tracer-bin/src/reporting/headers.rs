use super::{ReportError, Reporter, Table};
use tracer_trace::Trace;

/// Every request and response header, one row per value.
pub struct HeaderReporter;

impl HeaderReporter {
    fn table(trace: &Trace) -> Table {
        let r = trace.record();
        let mut t = Table::new(vec!["", "Key", "Value"]);
        for (section, headers) in [
            ("Request", &r.request_headers),
            ("Response", &r.response_headers),
        ] {
            for (k, v) in headers.iter() {
                t.push_row(vec![section, k, v]);
            }
        }
        t
    }
}

impl Reporter for HeaderReporter {
    fn title(&self) -> &'static str {
        "Request and Response Headers"
    }

    fn description(&self) -> &'static str {
        "Shows Request and Response headers from a HTTP/HTTPS request"
    }

    fn report(&self, trace: &Trace) -> Result<String, ReportError> {
        Ok(HeaderReporter::table(trace).to_string())
    }
}
