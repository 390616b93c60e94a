use crate::events::{Event, TraceHandle};
use crate::headers::Headers;
use crate::record::{Endpoints, TraceRecord};
use crate::timestamp::Timestamp;
use crate::trace::Trace;
use crossbeam::channel::{unbounded, Receiver, Sender};
use slog::{debug, info, o, Logger};
use std::io;
use std::net::{IpAddr, SocketAddr};

/// Mutable record of one request's lifecycle.
///
/// The collector is a passive recorder: it applies whatever it is told in
/// the order it is told, and never fails. Hooks running elsewhere reach it
/// through a [`TraceHandle`]; the owner drains them with
/// [`process_outstanding`](TraceCollector::process_outstanding). Body bytes
/// are fed through the `io::Write` impl.
pub struct TraceCollector {
    record: TraceRecord,
    tx: Sender<(Event, Timestamp)>,
    rx: Receiver<(Event, Timestamp)>,
    logger: Logger,
}

impl TraceCollector {
    pub fn new(logger: Logger) -> TraceCollector {
        let (tx, rx) = unbounded();
        TraceCollector {
            record: TraceRecord::default(),
            tx,
            rx,
            logger,
        }
    }

    pub fn handle(&self) -> TraceHandle {
        TraceHandle::new(self.tx.clone())
    }

    /// The record as collected so far.
    pub fn record(&self) -> &TraceRecord {
        &self.record
    }

    pub fn process_outstanding(&mut self) {
        let rx = self.rx.clone();
        while let Ok((event, at)) = rx.try_recv() {
            self.apply(event, at);
        }
    }

    pub fn apply(&mut self, event: Event, at: Timestamp) {
        match event {
            Event::DnsStart { host } => self.start_dns(at, host),
            Event::DnsDone { addrs } => self.end_dns(at, addrs),
            Event::ConnectStart { network, addr } => self.start_connect(at, network, addr),
            Event::ConnectDone {
                network,
                addr,
                error,
            } => self.end_connect(at, network, addr, error),
            Event::TlsStart => self.start_tls(at),
            Event::TlsDone {
                version,
                cipher_suite,
                server_name,
            } => self.end_tls(at, version, cipher_suite, server_name),
            Event::SessionStart { host_port } => self.start_session(at, host_port),
            Event::SessionAcquired { local, remote } => self.got_session(at, local, remote),
            Event::RequestWritten { error } => self.wrote_request(at, error),
            Event::FirstByte => self.first_byte_received(at),
        }
    }

    pub fn start_dns(&mut self, at: Timestamp, host: String) {
        info!(self.logger, "DNS request for '{}' starting", host);
        self.record.dns.start = Some(at);
        self.record.dns.host = Some(host);
    }

    pub fn end_dns(&mut self, at: Timestamp, addrs: Vec<IpAddr>) {
        info!(
            self.logger,
            "DNS request for '{}' returned: {:?}",
            self.record.dns.host.as_deref().unwrap_or(""),
            addrs
        );
        self.record.dns.end = Some(at);
        self.record.dns.addrs = addrs;
    }

    pub fn start_connect(&mut self, at: Timestamp, network: String, addr: String) {
        info!(
            self.logger,
            "Initiating {} connection to {}",
            network.to_uppercase(),
            addr
        );
        let c = &mut self.record.connection;
        c.start = Some(at);
        c.protocol = Some(network);
        c.address = Some(addr);
    }

    pub fn end_connect(
        &mut self,
        at: Timestamp,
        network: String,
        addr: String,
        error: Option<String>,
    ) {
        match error {
            None => info!(self.logger, "Connection to {} succeeded", addr),
            Some(ref e) => info!(self.logger, "Connection to {} failed: {}", addr, e),
        }
        let c = &mut self.record.connection;
        c.end = Some(at);
        c.protocol = Some(network);
        c.address = Some(addr);
        c.error = error;
    }

    pub fn start_tls(&mut self, at: Timestamp) {
        info!(self.logger, "Initiating TLS handshake");
        self.record.tls.start = Some(at);
    }

    pub fn end_tls(
        &mut self,
        at: Timestamp,
        version: Option<u16>,
        cipher_suite: Option<u16>,
        server_name: String,
    ) {
        info!(self.logger, "TLS handshake with '{}' finished", server_name);
        let t = &mut self.record.tls;
        t.end = Some(at);
        t.version = version;
        t.cipher_suite = cipher_suite;
        t.server_name = Some(server_name);
    }

    pub fn start_session(&mut self, at: Timestamp, host_port: String) {
        info!(self.logger, "Initiating session to {}", host_port);
        self.record.session.start = Some(at);
        self.record.session.host_port = Some(host_port);
    }

    pub fn got_session(&mut self, at: Timestamp, local: SocketAddr, remote: SocketAddr) {
        info!(
            self.logger,
            "Initiated session to {}: {} => {}",
            self.record.session.host_port.as_deref().unwrap_or(""),
            local,
            remote
        );
        self.record.session.end = Some(at);
        self.record.session.endpoints = Some(Endpoints { local, remote });
    }

    pub fn wrote_request(&mut self, at: Timestamp, error: Option<String>) {
        match error {
            None => info!(self.logger, "HTTP request made"),
            Some(ref e) => info!(self.logger, "HTTP request failed: {}", e),
        }
        self.record.request.start = Some(at);
        self.record.request.error = error;
    }

    pub fn first_byte_received(&mut self, at: Timestamp) {
        info!(self.logger, "Received first byte");
        self.record.first_byte = Some(at);
        let t = &mut self.record.transfer;
        if t.current_second.is_none() {
            t.current_second = Some(at.as_secs());
        }
    }

    pub fn set_request_headers(&mut self, headers: Headers) {
        debug!(self.logger, "Request headers:");
        for (k, v) in headers.iter() {
            debug!(self.logger, "  {}: {}", k, v);
        }
        self.record.request_headers = headers;
    }

    pub fn set_response_headers(&mut self, headers: Headers) {
        debug!(self.logger, "Response headers:");
        for (k, v) in headers.iter() {
            debug!(self.logger, "  {}: {}", k, v);
        }
        self.record.response_headers = headers;
    }

    /// Marks the start of the body transfer.
    pub fn begin_transfer(&mut self, at: Timestamp) {
        self.record.start = Some(at);
    }

    /// Counts `n` body bytes observed at `at`.
    ///
    /// History is kept per wall-clock second: when `at` falls in a different
    /// second than the last write, the bytes accumulated for that earlier
    /// second are appended to `per_second` before counting the new ones.
    pub fn record_bytes(&mut self, n: usize, at: Timestamp) {
        let n = n as u64;
        let second = at.as_secs();
        let t = &mut self.record.transfer;
        t.total_bytes += n;
        match t.current_second {
            Some(current) if current != second => {
                debug!(
                    self.logger,
                    "{} transferred, {} bytes/s", t.total_bytes, t.current_second_bytes
                );
                t.per_second.push(t.current_second_bytes);
                t.current_second_bytes = 0;
                t.current_second = Some(second);
            }
            Some(_) => {}
            None => t.current_second = Some(second),
        }
        t.current_second_bytes += n;
    }

    /// Freezes the record with `at` as the end of the transfer.
    ///
    /// Outstanding hook events are applied first, and a partially filled
    /// trailing second is flushed so the history sums to the total.
    pub fn finish(mut self, at: Timestamp) -> Trace {
        self.process_outstanding();
        self.record.end = Some(at);
        let t = &mut self.record.transfer;
        if t.current_second_bytes > 0 {
            t.per_second.push(t.current_second_bytes);
            t.current_second_bytes = 0;
        }
        Trace::from(self.record)
    }
}

impl Default for TraceCollector {
    fn default() -> TraceCollector {
        TraceCollector::new(Logger::root(slog::Discard, o!()))
    }
}

impl io::Write for TraceCollector {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.record_bytes(buf.len(), Timestamp::now());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn ts(secs: u64, nanos: u64) -> Timestamp {
        Timestamp::from_nanos(secs * 1_000_000_000 + nanos)
    }

    #[test]
    fn writes_within_one_second_accumulate() {
        let mut c = TraceCollector::default();
        c.record_bytes(10, ts(100, 1));
        c.record_bytes(20, ts(100, 2));
        c.record_bytes(30, ts(100, 3));
        let t = &c.record().transfer;
        assert_eq!(t.total_bytes, 60);
        assert_eq!(t.current_second_bytes, 60);
        assert!(t.per_second.is_empty());
    }

    #[test]
    fn second_boundary_flushes_previous_bucket() {
        let mut c = TraceCollector::default();
        c.first_byte_received(ts(100, 0));
        c.record_bytes(10, ts(100, 10));
        c.record_bytes(20, ts(100, 20));
        c.record_bytes(30, ts(100, 30));
        c.record_bytes(5, ts(101, 0));
        let t = &c.record().transfer;
        assert_eq!(t.per_second, vec![60]);
        assert_eq!(t.current_second_bytes, 5);
        assert_eq!(t.current_second, Some(101));
        assert_eq!(t.total_bytes, 65);
    }

    #[test]
    fn idle_seconds_collapse_into_one_entry() {
        let mut c = TraceCollector::default();
        c.record_bytes(7, ts(10, 0));
        c.record_bytes(3, ts(15, 0));
        assert_eq!(c.record().transfer.per_second, vec![7]);
    }

    #[test]
    fn finish_flushes_trailing_second() {
        let mut c = TraceCollector::default();
        c.begin_transfer(ts(100, 0));
        c.record_bytes(10, ts(100, 5));
        c.record_bytes(20, ts(101, 5));
        let trace = c.finish(ts(101, 500_000_000));
        let t = &trace.record().transfer;
        assert_eq!(t.per_second, vec![10, 20]);
        assert_eq!(t.per_second.iter().sum::<u64>(), t.total_bytes);
        assert_eq!(trace.duration(), Some(std::time::Duration::from_millis(1500)));
    }

    #[test]
    fn io_write_counts_everything() {
        let mut c = TraceCollector::default();
        let mut body: &[u8] = b"hello world";
        std::io::copy(&mut body, &mut c).unwrap();
        c.write_all(b"!").unwrap();
        assert_eq!(c.record().transfer.total_bytes, 12);
    }

    #[test]
    fn handle_events_apply_in_order() {
        let mut c = TraceCollector::default();
        let h = c.handle();
        let local: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let remote: SocketAddr = "127.0.0.1:80".parse().unwrap();
        h.session_start("example.com:80");
        h.dns_start("example.com");
        h.dns_done(vec![remote.ip()]);
        h.connect_start("tcp", "127.0.0.1:80");
        h.connect_done("tcp", "127.0.0.1:80", None);
        h.session_acquired(local, remote);
        h.request_written(None);
        h.first_byte();
        c.process_outstanding();

        let r = c.record();
        assert_eq!(r.dns.host.as_deref(), Some("example.com"));
        assert_eq!(r.dns.addrs, vec![remote.ip()]);
        assert_eq!(r.connection.protocol.as_deref(), Some("tcp"));
        assert!(r.connection.error.is_none());
        assert_eq!(r.session.local(), Some(local));
        assert_eq!(r.session.remote(), Some(remote));
        assert!(r.dns.end >= r.dns.start);
        assert!(r.connection.end >= r.connection.start);
        assert!(r.first_byte >= r.request.start);
        assert!(r.tls.start.is_none());
        assert!(r.transfer.current_second.is_some());
    }

    #[test]
    fn connect_failure_leaves_later_phases_unset() {
        let mut c = TraceCollector::default();
        let h = c.handle();
        h.connect_start("tcp", "10.0.0.1:443");
        h.connect_done("tcp", "10.0.0.1:443", Some("connection refused".into()));
        let trace = c.finish(Timestamp::now());
        let r = trace.record();
        assert_eq!(r.connection.error.as_deref(), Some("connection refused"));
        assert!(r.connection.end.is_some());
        assert!(r.tls.start.is_none());
        assert!(r.session.endpoints.is_none());
        assert!(r.request.start.is_none());
        assert!(r.first_byte.is_none());
        assert_eq!(trace.duration(), None);
    }

    #[test]
    fn events_after_finish_are_ignored() {
        let c = TraceCollector::default();
        let h = c.handle();
        let trace = c.finish(Timestamp::now());
        h.first_byte();
        assert!(trace.record().first_byte.is_none());
    }
}
