//! TCP connect probe: one handshake attempt per (host, port) pair.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use securenet_common::{Probe, ProbeResult, ProbeState, SecureNetResult, Target};

/// Connect-based probe. Opens a transient outbound connection and closes it
/// immediately; no persistent state, no retries. Resilience belongs to the
/// caller, which may re-invoke the whole scan.
pub struct TcpProbe {
    timeout: Duration,
}

impl TcpProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-probe connect timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
        }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    /// Probe a single target. Connection faults are folded into the probe
    /// state: refusal means `Closed`, timeout or any other I/O fault means
    /// `Error`. Both are treated as not-open by the coordinator.
    async fn probe(&self, target: &Target) -> SecureNetResult<ProbeResult> {
        let addr = SocketAddr::new(target.ip, target.port);
        let start = Instant::now();

        let state = match timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => ProbeState::Open,
            Ok(Err(e)) => match e.kind() {
                ErrorKind::ConnectionRefused => ProbeState::Closed,
                _ => ProbeState::Error,
            },
            Err(_) => ProbeState::Error,
        };

        let rtt = start.elapsed();
        trace!(%target, %state, rtt_ms = rtt.as_millis() as u64, "probe finished");
        Ok(ProbeResult::new(*target, state).with_rtt(rtt))
    }

    fn name(&self) -> &str {
        "tcp-connect"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn open_port_reports_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = TcpProbe::new().with_timeout(Duration::from_millis(500));
        let target = Target::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        let result = probe.probe(&target).await.unwrap();
        assert_eq!(result.state, ProbeState::Open);
    }

    #[tokio::test]
    async fn refused_port_reports_closed() {
        // Bind then drop so the port is very likely unbound.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let probe = TcpProbe::new().with_timeout(Duration::from_millis(500));
        let target = Target::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        let result = probe.probe(&target).await.unwrap();
        assert_eq!(result.state, ProbeState::Closed);
    }

    #[tokio::test]
    async fn unroutable_target_reports_error() {
        // RFC 5737 TEST-NET-1 is not routed; expect a timeout.
        let probe = TcpProbe::new().with_timeout(Duration::from_millis(100));
        let target = Target::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 80);
        let result = probe.probe(&target).await.unwrap();
        assert!(matches!(result.state, ProbeState::Error | ProbeState::Closed));
    }
}
