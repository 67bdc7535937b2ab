//! Output formatting for scan and monitor reports. All structure lives in
//! the report types; this module only renders them.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::Result;

use securenet_common::{ScanReport, SecurityReport};

/// Print a scan report in the requested format.
pub fn print_scan_report(report: &ScanReport, format: &str) -> Result<()> {
    match format.trim().to_lowercase().as_str() {
        "json" | "j" => print_json(report)?,
        "table" | "text" | "t" | "" => print_table(report),
        other => {
            eprintln!("Warning: unknown format '{other}', using table");
            print_table(report);
        }
    }
    Ok(())
}

fn print_table(report: &ScanReport) {
    println!();
    println!("Scan {} of {}", report.id, report.subnet);
    println!("{:-<60}", "");
    if report.hosts.is_empty() {
        println!("No active hosts discovered.");
    } else {
        println!("{:<20} {:<40}", "HOST", "OPEN PORTS");
        println!("{:-<60}", "");
        for host in &report.hosts {
            let ports = host
                .open_ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            println!("{:<20} {:<40}", host.ip.to_string(), ports);
        }
    }
    println!("{:-<60}", "");
    println!("Summary:");
    println!("  Active hosts:  {}", report.hosts.len());
    println!("  Probes sent:   {}", report.stats.probed);
    println!("  Open ports:    {}", report.stats.open);
    println!("  Closed ports:  {}", report.stats.closed);
    println!("  Probe errors:  {}", report.stats.errors);
    println!("  Scan duration: {}", format_duration(report.elapsed));
    println!();
}

fn print_json(report: &ScanReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Print a monitor snapshot: totals plus the retained alert history.
pub fn print_security_report(report: &SecurityReport) {
    println!();
    println!("Security report");
    println!("{:-<60}", "");
    println!("  Packets analyzed: {}", report.total_packets_analyzed);
    println!("  Alerts triggered: {}", report.alerts_triggered);
    if report.recent_alerts.is_empty() {
        println!("  No recent alerts.");
    } else {
        println!("  Recent alerts:");
        for alert in &report.recent_alerts {
            println!(
                "    [{}] {} (packet count {})",
                alert.timestamp.format("%Y-%m-%d %H:%M:%S"),
                alert.message,
                alert.packet_count
            );
        }
    }
    println!();
}

pub fn print_sweep(hosts: &[IpAddr]) {
    println!();
    if hosts.is_empty() {
        println!("No responsive hosts.");
    } else {
        println!("Responsive hosts ({}):", hosts.len());
        for host in hosts {
            println!("  {host}");
        }
    }
    println!();
}

fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {:02}.{:03}s", secs / 60, secs % 60, elapsed.subsec_millis())
    } else {
        format!("{}.{:03}s", secs, elapsed.subsec_millis())
    }
}
