//! Threat monitor: a single ordered consumer of one packet stream.
//!
//! Packets are processed strictly in delivery order, which keeps the
//! cumulative counter and the alert history race-free without locking the
//! hot path. `security_report` takes a snapshot concurrently: atomic counter
//! reads plus a short-lived lock to copy the bounded alert ring.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use securenet_common::{
    Alert, AlertPolicy, CaptureSource, Classification, MonitorConfig, PacketRecord,
    SecureNetError, SecureNetResult, SecurityReport,
};

use crate::classify::classify;

/// Lifecycle of the monitor. `Stopped` is terminal; a stopped monitor is not
/// restarted, callers construct a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    Idle,
    Running,
    Stopped,
}

pub struct ThreatMonitor {
    config: MonitorConfig,
    /// Monotonic for the process lifetime; never decremented.
    packet_count: AtomicU64,
    /// Total alerts ever fired, independent of the retained history.
    alerts_triggered: AtomicU64,
    /// Bounded ring of the most recent alerts, oldest first.
    alerts: Mutex<VecDeque<Alert>>,
    phase: Mutex<MonitorPhase>,
}

impl ThreatMonitor {
    pub fn new(config: MonitorConfig) -> SecureNetResult<Self> {
        config.validate()?;
        let history = config.history_limit;
        Ok(Self {
            config,
            packet_count: AtomicU64::new(0),
            alerts_triggered: AtomicU64::new(0),
            alerts: Mutex::new(VecDeque::with_capacity(history)),
            phase: Mutex::new(MonitorPhase::Idle),
        })
    }

    pub fn phase(&self) -> MonitorPhase {
        *self.phase.lock()
    }

    /// Consume `source` until it ends or faults. This is the `Idle` →
    /// `Running` transition; there is no way back to `Idle`. The source is
    /// owned for the lifetime of the run and dropped on every exit path. A
    /// capture fault moves the monitor to `Stopped` and propagates — the
    /// monitor never stops silently.
    pub fn run<S: CaptureSource>(&self, mut source: S) -> SecureNetResult<()> {
        {
            let mut phase = self.phase.lock();
            if *phase != MonitorPhase::Idle {
                return Err(SecureNetError::Config(
                    "monitor already started; construct a new one to restart".into(),
                ));
            }
            *phase = MonitorPhase::Running;
        }
        info!(source = %source.describe(), "starting network monitoring");

        loop {
            match source.next_packet() {
                Ok(Some(packet)) => self.handle_packet(&packet),
                Ok(None) => {
                    *self.phase.lock() = MonitorPhase::Stopped;
                    info!("capture source ended");
                    return Ok(());
                }
                Err(e) => {
                    *self.phase.lock() = MonitorPhase::Stopped;
                    error!("monitoring error: {e}");
                    return Err(e);
                }
            }
        }
    }

    /// Per-packet processing, in delivery order: count, classify, check the
    /// volume threshold. Classification feeds logging only.
    pub fn handle_packet(&self, packet: &PacketRecord) {
        let count = self.packet_count.fetch_add(1, Ordering::Relaxed) + 1;

        match classify(packet) {
            Classification::SynProbe => debug!(src = ?packet.src, "TCP SYN packet detected"),
            Classification::Icmp => info!(src = ?packet.src, "ICMP packet"),
            Classification::Other => {}
        }

        if count > self.config.alert_threshold && self.should_alert(count) {
            self.trigger_alert(
                format!("High traffic volume detected: {count} packets"),
                count,
            );
        }
    }

    /// Rearm policy, evaluated only once the counter is past the threshold.
    fn should_alert(&self, count: u64) -> bool {
        let past = count - self.config.alert_threshold;
        match self.config.policy {
            AlertPolicy::EveryPacket => true,
            AlertPolicy::OncePerCrossing => past == 1,
            AlertPolicy::EveryN(n) => (past - 1) % n == 0,
        }
    }

    /// Append to the bounded history, evicting the oldest on overflow. Alerts
    /// are never retried or deduplicated.
    fn trigger_alert(&self, message: String, packet_count: u64) {
        warn!(packet_count, "SECURITY ALERT: {message}");
        self.alerts_triggered.fetch_add(1, Ordering::Relaxed);

        let alert = Alert {
            timestamp: Utc::now(),
            message,
            packet_count,
        };
        let mut ring = self.alerts.lock();
        if ring.len() == self.config.history_limit {
            ring.pop_front();
        }
        ring.push_back(alert);
    }

    /// Snapshot of the monitor state. Safe to call while packets are being
    /// processed; never drains or blocks the stream.
    pub fn security_report(&self) -> SecurityReport {
        let recent_alerts: Vec<Alert> = self.alerts.lock().iter().cloned().collect();
        SecurityReport {
            total_packets_analyzed: self.packet_count.load(Ordering::Relaxed),
            alerts_triggered: self.alerts_triggered.load(Ordering::Relaxed),
            recent_alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ReplaySource;
    use securenet_common::tcp_flags;

    fn monitor(threshold: u64, policy: AlertPolicy) -> ThreatMonitor {
        ThreatMonitor::new(MonitorConfig {
            alert_threshold: threshold,
            history_limit: 5,
            policy,
        })
        .unwrap()
    }

    fn feed(monitor: &ThreatMonitor, packets: u64) {
        for _ in 0..packets {
            monitor.handle_packet(&PacketRecord::tcp(tcp_flags::SYN | tcp_flags::ACK));
        }
    }

    #[test]
    fn threshold_crossing_alerts_every_packet_by_default() {
        let m = monitor(100, AlertPolicy::EveryPacket);
        feed(&m, 105);

        let report = m.security_report();
        assert_eq!(report.total_packets_analyzed, 105);
        assert_eq!(report.alerts_triggered, 5);
        let counts: Vec<u64> = report.recent_alerts.iter().map(|a| a.packet_count).collect();
        assert_eq!(counts, vec![101, 102, 103, 104, 105]);
    }

    #[test]
    fn history_is_a_bounded_ring() {
        let m = monitor(2, AlertPolicy::EveryPacket);
        feed(&m, 10);

        let report = m.security_report();
        // 8 crossings total, only the most recent 5 retained, oldest evicted.
        assert_eq!(report.alerts_triggered, 8);
        assert_eq!(report.recent_alerts.len(), 5);
        let counts: Vec<u64> = report.recent_alerts.iter().map(|a| a.packet_count).collect();
        assert_eq!(counts, vec![6, 7, 8, 9, 10]);
        // Chronological order.
        for pair in report.recent_alerts.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn once_per_crossing_fires_a_single_alert() {
        let m = monitor(100, AlertPolicy::OncePerCrossing);
        feed(&m, 150);

        let report = m.security_report();
        assert_eq!(report.alerts_triggered, 1);
        assert_eq!(report.recent_alerts[0].packet_count, 101);
    }

    #[test]
    fn every_n_rearms_on_a_packet_window() {
        let m = monitor(2, AlertPolicy::EveryN(3));
        feed(&m, 10);

        let report = m.security_report();
        let counts: Vec<u64> = report.recent_alerts.iter().map(|a| a.packet_count).collect();
        assert_eq!(counts, vec![3, 6, 9]);
    }

    #[test]
    fn counter_exact_below_threshold_stays_quiet() {
        let m = monitor(100, AlertPolicy::EveryPacket);
        feed(&m, 100);

        let report = m.security_report();
        assert_eq!(report.total_packets_analyzed, 100);
        assert_eq!(report.alerts_triggered, 0);
        assert!(report.recent_alerts.is_empty());
    }

    #[test]
    fn clean_end_of_stream_stops_the_monitor() {
        let m = monitor(100, AlertPolicy::EveryPacket);
        assert_eq!(m.phase(), MonitorPhase::Idle);

        let source = ReplaySource::new(vec![PacketRecord::icmp(); 3]);
        m.run(source).unwrap();
        assert_eq!(m.phase(), MonitorPhase::Stopped);
        assert_eq!(m.security_report().total_packets_analyzed, 3);
    }

    #[test]
    fn capture_fault_propagates_and_stops() {
        let m = monitor(100, AlertPolicy::EveryPacket);
        let source = ReplaySource::new(vec![PacketRecord::icmp(); 2]).with_fault("link down");

        let err = m.run(source).unwrap_err();
        assert!(matches!(err, SecureNetError::Capture(_)));
        assert_eq!(m.phase(), MonitorPhase::Stopped);
        // Packets delivered before the fault were still counted.
        assert_eq!(m.security_report().total_packets_analyzed, 2);
    }

    #[test]
    fn stopped_monitor_cannot_be_restarted() {
        let m = monitor(100, AlertPolicy::EveryPacket);
        m.run(ReplaySource::new(Vec::new())).unwrap();

        let err = m.run(ReplaySource::new(Vec::new())).unwrap_err();
        assert!(matches!(err, SecureNetError::Config(_)));
    }
}
