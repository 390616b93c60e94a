use super::{addr_or_dash, require_headers, ReportError, Reporter, Table};
use std::fmt::Write;
use tracer_trace::Trace;

const LB_POP: &str = "X-Ipfs-Lb-Pop";
const POP: &str = "X-Ipfs-Pop";
const PROXY_CACHE: &str = "X-Proxy-Cache";

/// The path a request took through an IPFS gateway.
pub struct IpfsGwReporter;

impl Reporter for IpfsGwReporter {
    fn title(&self) -> &'static str {
        "IPFS Gateway Path"
    }

    fn description(&self) -> &'static str {
        "Shows Information about the path through the IPFS Gateway"
    }

    fn report(&self, trace: &Trace) -> Result<String, ReportError> {
        let [lb, node] = require_headers(trace, [LB_POP, POP])?;
        let r = trace.record();

        let mut t = Table::new(vec!["Client", "Gateway", "Load Balancer", "IPFS Node"]);
        t.push_row(vec![
            addr_or_dash(r.session.local()),
            addr_or_dash(r.session.remote()),
            lb.to_string(),
            node.to_string(),
        ]);
        let mut out = t.to_string();
        if let Some(cache) = r.response_headers.first(PROXY_CACHE) {
            writeln!(out, "The request was an IPFS gateway cache {}", cache)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tracer_trace::data::{Endpoints, TraceRecord};
    use tracer_trace::Headers;

    fn trace(headers: Vec<(&str, &str)>) -> Trace {
        let mut r = TraceRecord::default();
        r.session.endpoints = Some(Endpoints {
            local: "192.168.1.5:53211".parse().unwrap(),
            remote: "209.94.90.1:443".parse().unwrap(),
        });
        r.response_headers = headers.into_iter().collect::<Headers>();
        Trace::from(r)
    }

    #[test]
    fn requires_lb_pop_first() {
        assert_eq!(
            IpfsGwReporter.report(&trace(vec![])),
            Err(ReportError::MissingHeader("X-Ipfs-Lb-Pop"))
        );
        assert_eq!(
            IpfsGwReporter.report(&trace(vec![("x-ipfs-pop", "node")])),
            Err(ReportError::MissingHeader("X-Ipfs-Lb-Pop"))
        );
        assert_eq!(
            IpfsGwReporter.report(&trace(vec![("x-ipfs-lb-pop", "lb")])),
            Err(ReportError::MissingHeader("X-Ipfs-Pop"))
        );
    }

    #[test]
    fn reports_path_and_cache_status() {
        let out = IpfsGwReporter
            .report(&trace(vec![
                ("X-Ipfs-Lb-Pop", "gateway-bank1-sjc1"),
                ("X-Ipfs-Pop", "ipfs-bank3-sjc1"),
                ("X-Proxy-Cache", "HIT"),
            ]))
            .unwrap();
        assert!(out.contains("192.168.1.5:53211"));
        assert!(out.contains("209.94.90.1:443"));
        assert!(out.contains("gateway-bank1-sjc1"));
        assert!(out.contains("ipfs-bank3-sjc1"));
        assert!(out.ends_with("The request was an IPFS gateway cache HIT\n"));
    }

    #[test]
    fn cache_line_only_when_present() {
        let out = IpfsGwReporter
            .report(&trace(vec![("X-Ipfs-Lb-Pop", "lb"), ("X-Ipfs-Pop", "node")]))
            .unwrap();
        assert!(!out.contains("gateway cache"));
    }

    #[test]
    fn missing_session_renders_dashes() {
        let mut r = TraceRecord::default();
        r.response_headers = vec![("X-Ipfs-Lb-Pop", "lb"), ("X-Ipfs-Pop", "node")]
            .into_iter()
            .collect::<Headers>();
        let out = IpfsGwReporter.report(&Trace::from(r)).unwrap();
        assert!(out.contains("| -      | -       | lb"));
    }
}
