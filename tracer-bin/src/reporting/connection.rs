use super::{ReportError, Reporter, Table};
use std::fmt::Write;
use std::time::Duration;
use tracer_trace::{Timing, Trace};

/// Timing of the session establishment stages: DNS, TCP, TLS, request write
/// and time to first byte.
pub struct ConnectionReporter;

fn seconds(d: Option<Duration>) -> String {
    match d {
        Some(d) => format!("{:.6}", d.as_secs_f64()),
        None => "-".into(),
    }
}

impl Reporter for ConnectionReporter {
    fn title(&self) -> &'static str {
        "Session Establishment"
    }

    fn description(&self) -> &'static str {
        "Shows the timing for various stages of establishment of a HTTP/HTTPS session"
    }

    fn report(&self, trace: &Trace) -> Result<String, ReportError> {
        let r = trace.record();
        let timing = Timing::from_trace(trace);
        let phases = timing.phases();

        let mut t = Table::new(phases.iter().map(|(label, _)| *label));
        t.push_row(phases.iter().map(|(_, d)| seconds(*d)));

        let mut dns = r.dns.host.clone().unwrap_or_default();
        if !r.dns.addrs.is_empty() {
            let addrs: Vec<String> = r.dns.addrs.iter().map(|a| a.to_string()).collect();
            write!(dns, "\n{}", addrs.join(", "))?;
        }
        let mut conn = r.connection.address.clone().unwrap_or_default();
        if let Some(ref e) = r.connection.error {
            write!(conn, "\nerror: {}", e)?;
        }
        let tls = match (r.tls.version_name(), r.tls.server_name.as_deref()) {
            (None, None) => String::new(),
            (ver, name) => format!(
                "ver: {}\nname: {}",
                ver.unwrap_or_default(),
                name.unwrap_or_default()
            ),
        };
        let mut req = String::new();
        if let Some(ref e) = r.request.error {
            write!(req, "error: {}", e)?;
        }
        t.push_row(vec![dns, conn, tls, req, String::new()]);

        Ok(t.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tracer_trace::data::TraceRecord;
    use tracer_trace::Timestamp;

    fn ts(n: u64) -> Option<Timestamp> {
        Some(Timestamp::from_nanos(n))
    }

    #[test]
    fn durations_in_fractional_seconds() {
        let mut r = TraceRecord::default();
        r.dns.start = ts(1_000);
        r.dns.end = ts(500_000_000);
        r.dns.host = Some("ipfs.io".into());
        r.dns.addrs = vec!["209.94.90.1".parse().unwrap()];
        r.connection.start = ts(500_000_000);
        r.connection.end = ts(750_000_000);
        r.connection.address = Some("209.94.90.1:443".into());
        r.tls.start = ts(750_000_000);
        r.tls.end = ts(1_000_000_000);
        r.tls.version = Some(0x0304);
        r.tls.server_name = Some("ipfs.io".into());
        let out = ConnectionReporter.report(&Trace::from(r)).unwrap();

        assert!(out.contains("0.499999"), "{}", out);
        assert!(out.contains("0.250000"));
        assert!(out.contains("209.94.90.1:443"));
        assert!(out.contains("ver: TLS 1.3"));
        assert!(out.contains("name: ipfs.io"));
        // request and first byte never happened
        assert!(out.contains("| -"));
    }

    #[test]
    fn empty_trace_still_reports() {
        let out = ConnectionReporter
            .report(&Trace::from(TraceRecord::default()))
            .unwrap();
        for label in ["DNS Lookup", "Connection", "TLS", "Request", "First Byte"] {
            assert!(out.contains(label));
        }
        assert!(!out.contains("0.0"));
    }

    #[test]
    fn connect_error_is_hinted() {
        let mut r = TraceRecord::default();
        r.connection.start = ts(10);
        r.connection.end = ts(20);
        r.connection.address = Some("10.0.0.1:80".into());
        r.connection.error = Some("connection refused".into());
        let out = ConnectionReporter.report(&Trace::from(r)).unwrap();
        assert!(out.contains("error: connection refused"));
    }
}
