#![forbid(unsafe_code)]

use crate::error::Error;
use crate::metrics::MetricsSink;
use std::fmt::Write as _;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::{debug, warn};

/// Sends DogStatsD lines over UDP without waiting for the network.
#[derive(Debug)]
pub struct StatsdSink {
    socket: UdpSocket,
    namespace: String,
}

impl StatsdSink {
    pub fn connect(address: impl ToSocketAddrs, namespace: impl Into<String>) -> Result<Self, Error> {
        let peer = address.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "statsd address resolved to nothing")
        })?;
        // bind to the wildcard of the peer's family
        let local: SocketAddr = match peer {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(peer)?;
        socket.set_nonblocking(true)?;
        let namespace = namespace.into();
        debug!(peer = ?socket.peer_addr().ok(), %namespace, "statsd sink ready");
        Ok(Self { socket, namespace })
    }

    fn send(&self, name: &str, line: String) {
        if let Err(err) = self.socket.send(line.as_bytes()) {
            warn!(%err, metric = name, "couldn't submit metric to statsd");
        }
    }

    fn count_line(&self, name: &str, delta: i64, tags: &[&str], sample_rate: f64) -> String {
        let mut line = format!("{}{}:{}|c", self.namespace, name, delta);
        if sample_rate < 1.0 {
            let _ = write!(line, "|@{sample_rate}");
        }
        if !tags.is_empty() {
            let _ = write!(line, "|#{}", tags.join(","));
        }
        line
    }

    fn gauge_line(&self, name: &str, value: f64) -> String {
        format!("{}{}:{}|g", self.namespace, name, value)
    }
}

impl MetricsSink for StatsdSink {
    fn count(&self, name: &str, delta: i64, tags: &[&str], sample_rate: f64) {
        if sample_rate < 1.0 && rand::random::<f64>() >= sample_rate {
            return;
        }
        self.send(name, self.count_line(name, delta, tags, sample_rate));
    }

    fn gauge(&self, name: &str, value: f64) {
        self.send(name, self.gauge_line(name, value));
    }
}
