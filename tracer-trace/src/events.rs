use crate::timestamp::Timestamp;
use crossbeam::channel::Sender;
use std::net::{IpAddr, SocketAddr};

/// A lifecycle hook firing, as delivered to the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DnsStart {
        host: String,
    },
    DnsDone {
        addrs: Vec<IpAddr>,
    },
    ConnectStart {
        network: String,
        addr: String,
    },
    ConnectDone {
        network: String,
        addr: String,
        error: Option<String>,
    },
    TlsStart,
    TlsDone {
        version: Option<u16>,
        cipher_suite: Option<u16>,
        server_name: String,
    },
    SessionStart {
        host_port: String,
    },
    SessionAcquired {
        local: SocketAddr,
        remote: SocketAddr,
    },
    RequestWritten {
        error: Option<String>,
    },
    FirstByte,
}

/// Cloneable sending side of a `TraceCollector`.
///
/// Every hook stamps the event when it fires, so the time recorded does not
/// depend on when the collector gets around to processing it.
#[derive(Debug, Clone)]
pub struct TraceHandle {
    sender: Sender<(Event, Timestamp)>,
}

impl TraceHandle {
    pub(crate) fn new(sender: Sender<(Event, Timestamp)>) -> TraceHandle {
        TraceHandle { sender }
    }

    pub fn send(&self, event: Event) {
        self.send_at(event, Timestamp::now())
    }

    pub fn send_at(&self, event: Event, at: Timestamp) {
        // The collector may already be finished; late events are dropped.
        let _ = self.sender.send((event, at));
    }

    pub fn dns_start<S: Into<String>>(&self, host: S) {
        self.send(Event::DnsStart { host: host.into() })
    }

    pub fn dns_done(&self, addrs: Vec<IpAddr>) {
        self.send(Event::DnsDone { addrs })
    }

    pub fn connect_start<N: Into<String>, A: Into<String>>(&self, network: N, addr: A) {
        self.send(Event::ConnectStart {
            network: network.into(),
            addr: addr.into(),
        })
    }

    pub fn connect_done<N: Into<String>, A: Into<String>>(
        &self,
        network: N,
        addr: A,
        error: Option<String>,
    ) {
        self.send(Event::ConnectDone {
            network: network.into(),
            addr: addr.into(),
            error,
        })
    }

    pub fn tls_start(&self) {
        self.send(Event::TlsStart)
    }

    pub fn tls_done<S: Into<String>>(
        &self,
        version: Option<u16>,
        cipher_suite: Option<u16>,
        server_name: S,
    ) {
        self.send(Event::TlsDone {
            version,
            cipher_suite,
            server_name: server_name.into(),
        })
    }

    pub fn session_start<S: Into<String>>(&self, host_port: S) {
        self.send(Event::SessionStart {
            host_port: host_port.into(),
        })
    }

    pub fn session_acquired(&self, local: SocketAddr, remote: SocketAddr) {
        self.send(Event::SessionAcquired { local, remote })
    }

    pub fn request_written(&self, error: Option<String>) {
        self.send(Event::RequestWritten { error })
    }

    pub fn first_byte(&self) {
        self.send(Event::FirstByte)
    }
}
