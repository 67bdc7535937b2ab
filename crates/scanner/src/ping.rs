//! Ping sweep: a thin convenience wrapper over the system `ping` binary.
//!
//! Not part of the core scan path; useful for a quick liveness pass before a
//! full port scan.

use std::net::IpAddr;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use ipnet::IpNet;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use securenet_common::{SecureNetError, SecureNetResult};

use crate::hosts::HostRange;

pub struct PingSweep {
    concurrency: usize,
    timeout: Duration,
}

impl PingSweep {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one echo request to every usable host of `subnet` and return the
    /// addresses that answered, in address order.
    pub async fn sweep(&self, subnet: IpNet, host_cap: u128) -> SecureNetResult<Vec<IpAddr>> {
        let hosts: Vec<IpAddr> = HostRange::new(subnet, host_cap)?.collect();
        info!(%subnet, hosts = hosts.len(), "starting ping sweep");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(hosts.len());
        for ip in hosts {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| SecureNetError::Cancelled)?;
            let timeout = self.timeout;
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                (ip, ping_once(ip, timeout).await)
            }));
        }

        let mut active = Vec::new();
        for handle in handles {
            if let Ok((ip, true)) = handle.await {
                info!(host = %ip, "active host found");
                active.push(ip);
            }
        }
        active.sort_unstable();
        Ok(active)
    }
}

impl Default for PingSweep {
    fn default() -> Self {
        Self {
            concurrency: 50,
            timeout: Duration::from_secs(2),
        }
    }
}

/// One echo request with a hard deadline. Any failure to spawn or a non-zero
/// exit is treated as no answer.
async fn ping_once(ip: IpAddr, timeout: Duration) -> bool {
    let mut cmd = Command::new("ping");
    #[cfg(target_os = "windows")]
    {
        let wait_ms = timeout.as_millis().max(1).to_string();
        cmd.args(["-n", "1", "-w", &wait_ms]);
    }
    #[cfg(not(target_os = "windows"))]
    {
        let wait_s = timeout.as_secs().max(1).to_string();
        cmd.args(["-c", "1", "-W", &wait_s]);
    }
    cmd.arg(ip.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    match tokio::time::timeout(timeout + Duration::from_secs(1), cmd.status()).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(e)) => {
            debug!(host = %ip, error = %e, "ping spawn failed");
            false
        }
        Err(_) => false,
    }
}
