use crate::timestamp::span;
use crate::trace::Trace;
use std::time::Duration;

/// Connection establishment broken down by phase.
///
/// A phase that never ran, or whose markers are out of order, is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub dns_lookup: Option<Duration>,
    pub connection: Option<Duration>,
    /// Handshake alone, excluding the TCP connect that precedes it.
    pub tls_handshake: Option<Duration>,
    pub request: Option<Duration>,
    pub first_byte: Option<Duration>,
}

impl Timing {
    pub fn from_trace(trace: &Trace) -> Timing {
        let r = trace.record();
        Timing {
            dns_lookup: span(r.dns.start, r.dns.end),
            connection: span(r.connection.start, r.connection.end),
            tls_handshake: span(r.tls.start, r.tls.end),
            request: span(r.session.end, r.request.start),
            first_byte: span(r.request.start, r.first_byte),
        }
    }

    /// The phases in report order, labelled.
    pub fn phases(&self) -> [(&'static str, Option<Duration>); 5] {
        [
            ("DNS Lookup", self.dns_lookup),
            ("Connection", self.connection),
            ("TLS", self.tls_handshake),
            ("Request", self.request),
            ("First Byte", self.first_byte),
        ]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::TraceRecord;
    use crate::timestamp::Timestamp;

    fn ts(n: u64) -> Option<Timestamp> {
        Some(Timestamp::from_nanos(n))
    }

    #[test]
    fn phases_from_marker_pairs() {
        let mut r = TraceRecord::default();
        r.dns.start = ts(1_000);
        r.dns.end = ts(500_000_000);
        r.connection.start = ts(500_000_000);
        r.connection.end = ts(600_000_000);
        r.tls.start = ts(600_000_000);
        r.tls.end = ts(800_000_000);
        r.session.end = ts(800_000_000);
        r.request.start = ts(850_000_000);
        r.first_byte = ts(1_000_000_000);
        let t = Timing::from_trace(&Trace::from(r));
        assert_eq!(t.dns_lookup, Some(Duration::from_nanos(499_999_000)));
        assert_eq!(t.connection, Some(Duration::from_millis(100)));
        assert_eq!(t.tls_handshake, Some(Duration::from_millis(200)));
        assert_eq!(t.request, Some(Duration::from_millis(50)));
        assert_eq!(t.first_byte, Some(Duration::from_millis(150)));
    }

    #[test]
    fn tls_phase_excludes_tcp_connect() {
        let mut r = TraceRecord::default();
        r.connection.start = ts(100_000_000);
        r.connection.end = ts(300_000_000);
        r.tls.start = ts(300_000_000);
        r.tls.end = ts(400_000_000);
        let t = Timing::from_trace(&Trace::from(r));
        assert_eq!(t.tls_handshake, Some(Duration::from_millis(100)));
    }

    #[test]
    fn plain_http_has_no_tls_phase() {
        let mut r = TraceRecord::default();
        r.connection.start = ts(10);
        r.connection.end = ts(20);
        let t = Timing::from_trace(&Trace::from(r));
        assert_eq!(t.tls_handshake, None);
        assert_eq!(t.dns_lookup, None);
        assert_eq!(t.connection, Some(Duration::from_nanos(10)));
    }
}
