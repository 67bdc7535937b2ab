//! Core data types shared across the SecureNet crates.
//!
//! Scan-side types (`Target`, `ProbeResult`, `HostSummary`) are scan-scoped
//! and immutable once produced. Monitor-side types (`PacketRecord`, `Alert`,
//! `SecurityReport`) are ephemeral or append-only; captured packets are never
//! persisted.

use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SecureNetError, SecureNetResult};

/// Ports probed when the caller does not supply a list.
pub const DEFAULT_PORTS: &[u16] = &[22, 80, 443, 3389, 5432];

/// TCP flag bits as they appear in the transport header.
pub mod tcp_flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
}

/// Outcome of a single connect probe.
///
/// `Error` covers timeouts and any non-refusal I/O fault; callers treat it
/// the same as `Closed`. No filtered/closed distinction is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeState {
    Open,
    Closed,
    Error,
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProbeState::Open => "open",
            ProbeState::Closed => "closed",
            ProbeState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Single scan target (IP + port).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub ip: IpAddr,
    pub port: u16,
}

impl Target {
    #[inline]
    #[must_use]
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Result of probing a single target. Immutable once produced; owned by the
/// coordinator until folded into a `HostSummary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub target: Target,
    pub state: ProbeState,
    /// Round-trip time measured for the probe (`Duration::ZERO` when unknown).
    pub rtt: Duration,
    pub timestamp: SystemTime,
}

impl ProbeResult {
    #[inline]
    #[must_use]
    pub fn new(target: Target, state: ProbeState) -> Self {
        Self {
            target,
            state,
            rtt: Duration::ZERO,
            timestamp: SystemTime::now(),
        }
    }

    /// Builder-style constructor that sets RTT at creation.
    #[inline]
    #[must_use]
    pub fn with_rtt(mut self, rtt: Duration) -> Self {
        self.rtt = rtt;
        self
    }

    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, ProbeState::Open)
    }
}

/// Aggregated open-port view of one host. Only hosts with at least one open
/// port produce a summary; the rest are presumed inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSummary {
    pub ip: IpAddr,
    /// Open ports, sorted ascending.
    pub open_ports: Vec<u16>,
    pub active: bool,
}

impl HostSummary {
    #[must_use]
    pub fn new(ip: IpAddr, open_ports: Vec<u16>) -> Self {
        Self {
            ip,
            open_ports,
            active: true,
        }
    }
}

/// Transport protocol tag of an observed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportProtocol {
    Tcp,
    Udp,
    Icmp,
    Other,
}

/// One decoded packet as delivered by a capture source.
///
/// Ephemeral: consumed synchronously by the classifier and then dropped.
/// Only header fields are carried; payloads are never inspected.
#[derive(Debug, Clone)]
pub struct PacketRecord {
    pub protocol: TransportProtocol,
    pub src: Option<IpAddr>,
    /// Transport-layer flag bits; zero for non-TCP packets.
    pub flags: u8,
    pub timestamp: SystemTime,
}

impl PacketRecord {
    #[must_use]
    pub fn new(protocol: TransportProtocol) -> Self {
        Self {
            protocol,
            src: None,
            flags: 0,
            timestamp: SystemTime::now(),
        }
    }

    #[must_use]
    pub fn tcp(flags: u8) -> Self {
        let mut record = Self::new(TransportProtocol::Tcp);
        record.flags = flags;
        record
    }

    #[must_use]
    pub fn icmp() -> Self {
        Self::new(TransportProtocol::Icmp)
    }

    #[must_use]
    pub fn with_src(mut self, src: IpAddr) -> Self {
        self.src = Some(src);
        self
    }
}

/// Classification tag emitted for one packet. Drives diagnostic logging only;
/// alerting stays keyed on total packet volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    SynProbe,
    Icmp,
    Other,
}

impl Classification {
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Classification::SynProbe => "syn-probe",
            Classification::Icmp => "icmp",
            Classification::Other => "other",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold-crossing record. Created only by the threat monitor, never
/// mutated, appended to a bounded history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Cumulative packet count at the moment the alert fired.
    pub packet_count: u64,
}

/// Read-only projection of the monitor state, safe to take while packets are
/// still being processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityReport {
    pub total_packets_analyzed: u64,
    /// Total alerts ever triggered; not capped by the retained history.
    pub alerts_triggered: u64,
    /// Most recent alerts in chronological order, at most the history limit.
    pub recent_alerts: Vec<Alert>,
}

/// Counters accumulated over one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub probed: usize,
    pub open: usize,
    pub closed: usize,
    pub errors: usize,
}

impl ScanStats {
    pub fn record(&mut self, state: ProbeState) {
        self.probed = self.probed.saturating_add(1);
        match state {
            ProbeState::Open => self.open = self.open.saturating_add(1),
            ProbeState::Closed => self.closed = self.closed.saturating_add(1),
            ProbeState::Error => self.errors = self.errors.saturating_add(1),
        }
    }

    /// A probe unit that failed outright, without producing a state.
    pub fn record_failure(&mut self) {
        self.probed = self.probed.saturating_add(1);
        self.errors = self.errors.saturating_add(1);
    }
}

/// Final scan output handed to the presentation layer as a plain value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub id: Uuid,
    pub subnet: String,
    pub hosts: Vec<HostSummary>,
    pub stats: ScanStats,
    pub elapsed: Duration,
}

impl ScanReport {
    #[must_use]
    pub fn new(subnet: String, hosts: Vec<HostSummary>, stats: ScanStats, elapsed: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            subnet,
            hosts,
            stats,
            elapsed,
        }
    }
}

/// Scan tuning, threaded into the coordinator at construction. There is no
/// process-wide settings module; every component receives its configuration
/// explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub ports: Vec<u16>,
    /// Fixed size of the probe worker pool.
    pub concurrency: usize,
    /// Per-probe connect timeout.
    pub timeout: Duration,
    /// Refuse to enumerate prefixes with more usable hosts than this.
    pub host_cap: u128,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.to_vec(),
            concurrency: 50,
            timeout: Duration::from_millis(1000),
            host_cap: 4096,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> SecureNetResult<()> {
        if self.concurrency == 0 {
            return Err(SecureNetError::Config(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(SecureNetError::Config("probe timeout must be non-zero".into()));
        }
        if self.host_cap == 0 {
            return Err(SecureNetError::Config("host cap must be at least 1".into()));
        }
        Ok(())
    }
}

/// Alert rearm policy applied once the counter is past the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertPolicy {
    /// Re-alert on every packet past the threshold. Compatible with the
    /// legacy behaviour and therefore the default.
    EveryPacket,
    /// Alert once at the first crossing.
    OncePerCrossing,
    /// Re-alert at most once per `n` packets past the threshold.
    EveryN(u64),
}

impl Default for AlertPolicy {
    fn default() -> Self {
        AlertPolicy::EveryPacket
    }
}

/// Monitor tuning, threaded in at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Cumulative packet count past which alerts fire.
    pub alert_threshold: u64,
    /// Number of recent alerts retained (ring-buffer capacity).
    pub history_limit: usize,
    pub policy: AlertPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            alert_threshold: 1000,
            history_limit: 5,
            policy: AlertPolicy::default(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> SecureNetResult<()> {
        if self.history_limit == 0 {
            return Err(SecureNetError::Config(
                "alert history limit must be at least 1".into(),
            ));
        }
        if let AlertPolicy::EveryN(0) = self.policy {
            return Err(SecureNetError::Config(
                "alert rearm interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn target_display() {
        let t = Target::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)), 80);
        assert_eq!(t.to_string(), "192.168.1.1:80");
    }

    #[test]
    fn probe_result_builder() {
        let target = Target::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 22);
        let r = ProbeResult::new(target, ProbeState::Open).with_rtt(Duration::from_millis(10));
        assert!(r.is_open());
        assert_eq!(r.rtt, Duration::from_millis(10));
    }

    #[test]
    fn scan_stats_records_states_and_failures() {
        let mut stats = ScanStats::default();
        stats.record(ProbeState::Open);
        stats.record(ProbeState::Closed);
        stats.record(ProbeState::Error);
        stats.record_failure();
        assert_eq!(stats.probed, 4);
        assert_eq!(stats.open, 1);
        assert_eq!(stats.closed, 1);
        assert_eq!(stats.errors, 2);
    }

    #[test]
    fn scan_config_rejects_zero_concurrency() {
        let config = ScanConfig {
            concurrency: 0,
            ..ScanConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(ScanConfig::default().validate().is_ok());
    }

    #[test]
    fn monitor_config_rejects_degenerate_values() {
        let config = MonitorConfig {
            history_limit: 0,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MonitorConfig {
            policy: AlertPolicy::EveryN(0),
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(MonitorConfig::default().validate().is_ok());
    }

    #[test]
    fn packet_record_helpers() {
        let p = PacketRecord::tcp(tcp_flags::SYN).with_src(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(p.protocol, TransportProtocol::Tcp);
        assert_eq!(p.flags, tcp_flags::SYN);
        assert!(p.src.is_some());
    }
}
