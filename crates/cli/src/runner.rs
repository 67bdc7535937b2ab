// runner.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use ipnet::IpNet;
use tracing::{info, warn};

use securenet_auth::RoleStore;
use securenet_common::{AlertPolicy, MonitorConfig, PermissionGate, ScanConfig};
use securenet_monitor::{LiveCapture, ThreatMonitor};
use securenet_scanner::{PingSweep, ScanCoordinator, TcpProbe};

use crate::output;

/// Permission names gating each operation: scanning opens connections
/// ("write"), monitoring surfaces alert history ("view_logs"), sweeping is a
/// read-only liveness pass ("read").
const SCAN_PERMISSION: &str = "write";
const MONITOR_PERMISSION: &str = "view_logs";
const SWEEP_PERMISSION: &str = "read";

pub async fn run_scan(
    user: &str,
    subnet: String,
    ports: String,
    concurrency: usize,
    timeout: u64,
    host_cap: u128,
    output_format: String,
) -> Result<()> {
    let gate = RoleStore::with_default_users();
    ensure_permission(&gate, user, SCAN_PERMISSION)?;

    let subnet: IpNet = subnet
        .parse()
        .context("invalid subnet (expected CIDR, e.g. 192.168.1.0/24)")?;
    let ports = parse_ports(&ports)?;

    info!(%subnet, ports = ports.len(), concurrency, "starting scan");

    let config = ScanConfig {
        ports,
        concurrency,
        timeout: Duration::from_millis(timeout),
        host_cap,
    };
    let probe = Arc::new(TcpProbe::new().with_timeout(config.timeout));
    let coordinator = ScanCoordinator::new(probe, config)?;

    // Ctrl-C aborts the scan; in-flight probes end at their own timeout.
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling scan");
            cancel.cancel();
        }
    });

    let report = coordinator.scan(subnet).await?;
    output::print_scan_report(&report, &output_format)?;
    Ok(())
}

pub async fn run_monitor(
    user: &str,
    interface: Option<String>,
    alert_threshold: u64,
    history: usize,
    policy: String,
) -> Result<()> {
    let gate = RoleStore::with_default_users();
    ensure_permission(&gate, user, MONITOR_PERMISSION)?;

    let config = MonitorConfig {
        alert_threshold,
        history_limit: history,
        policy: parse_policy(&policy)?,
    };
    let monitor = Arc::new(ThreatMonitor::new(config)?);
    let capture = LiveCapture::open(interface.as_deref())?;

    // The capture loop blocks in the datalink receiver, so it gets its own
    // thread; the monitor owns the capture handle until it exits.
    let worker = monitor.clone();
    let outcome = tokio::task::spawn_blocking(move || worker.run(capture))
        .await
        .context("monitor task failed")?;

    // Print the final snapshot even when the capture layer faulted.
    output::print_security_report(&monitor.security_report());
    outcome?;
    Ok(())
}

pub async fn run_sweep(user: &str, subnet: String, host_cap: u128) -> Result<()> {
    let gate = RoleStore::with_default_users();
    ensure_permission(&gate, user, SWEEP_PERMISSION)?;

    let subnet: IpNet = subnet
        .parse()
        .context("invalid subnet (expected CIDR, e.g. 192.168.1.0/24)")?;
    let active = PingSweep::new().sweep(subnet, host_cap).await?;
    output::print_sweep(&active);
    Ok(())
}

/// Explicit call-site check: identity and permission are passed in, never
/// recovered from the protected function's own arguments.
fn ensure_permission(gate: &dyn PermissionGate, user: &str, permission: &str) -> Result<()> {
    if gate.has_permission(user, permission) {
        return Ok(());
    }
    let role = gate
        .current_role(user)
        .unwrap_or_else(|| "none".to_string());
    bail!("user '{user}' (role: {role}) lacks required permission '{permission}'")
}

/// Parses a port string like "80,443,1000-1010" into a vector of ports.
fn parse_ports(ports_str: &str) -> Result<Vec<u16>> {
    let mut ports = Vec::new();

    for part in ports_str.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: u16 = start
                .parse()
                .context(format!("invalid start port: {start}"))?;
            let end: u16 = end.parse().context(format!("invalid end port: {end}"))?;
            if start > end {
                bail!("invalid port range: start > end");
            }
            ports.extend(start..=end);
        } else {
            let port: u16 = part.parse().context(format!("invalid port: {part}"))?;
            ports.push(port);
        }
    }

    if ports.is_empty() {
        bail!("no ports specified");
    }
    ports.sort_unstable();
    ports.dedup();
    Ok(ports)
}

/// Parses an alert rearm policy: "every-packet", "once", or "every-n:<N>".
fn parse_policy(policy: &str) -> Result<AlertPolicy> {
    match policy.trim() {
        "every-packet" => Ok(AlertPolicy::EveryPacket),
        "once" => Ok(AlertPolicy::OncePerCrossing),
        other => {
            if let Some(n) = other.strip_prefix("every-n:") {
                let n: u64 = n.parse().context(format!("invalid rearm interval: {n}"))?;
                if n == 0 {
                    bail!("rearm interval must be at least 1");
                }
                return Ok(AlertPolicy::EveryN(n));
            }
            Err(anyhow!(
                "unknown alert policy '{other}' (expected every-packet, once, or every-n:<N>)"
            ))
        }
    }
}
