//! Scan coordination: a bounded worker pool draining the host × port
//! cross-product, with a join barrier before aggregation.

use std::collections::{BTreeMap, VecDeque};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use ipnet::IpNet;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use securenet_common::{
    HostSummary, Probe, ScanConfig, ScanReport, ScanStats, SecureNetError, SecureNetResult, Target,
};

use crate::hosts::HostRange;

/// Coordinates one scan at a time over a fixed-size worker pool. The pool is
/// scan-scoped: workers are spawned per `scan` call and torn down at its join
/// barrier.
pub struct ScanCoordinator {
    probe: Arc<dyn Probe>,
    config: ScanConfig,
    cancel: CancellationToken,
}

impl std::fmt::Debug for ScanCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCoordinator")
            .field("probe", &self.probe.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ScanCoordinator {
    /// Invalid tuning values (zero concurrency, zero timeout) are rejected
    /// here, before any scan is attempted.
    pub fn new(probe: Arc<dyn Probe>, config: ScanConfig) -> SecureNetResult<Self> {
        config.validate()?;
        Ok(Self {
            probe,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Token that aborts the whole scan when cancelled. Workers stop pulling
    /// new work; in-flight probes are abandoned at their own timeout.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Scan every usable host of `subnet` across the configured port list.
    ///
    /// Individual probe faults never abort the scan; only failure to derive
    /// the host or port list is fatal, and that happens before any probe is
    /// dispatched. Aggregation runs only after every worker has exited.
    pub async fn scan(&self, subnet: IpNet) -> SecureNetResult<ScanReport> {
        let started = Instant::now();

        if self.config.ports.is_empty() {
            return Err(SecureNetError::Enumeration("no ports to scan".into()));
        }
        let hosts: Vec<IpAddr> = HostRange::new(subnet, self.config.host_cap)?.collect();

        info!(
            %subnet,
            hosts = hosts.len(),
            ports = self.config.ports.len(),
            concurrency = self.config.concurrency,
            "starting scan"
        );

        // Shared work queue over the full cross-product. Each (host, port)
        // pair is probed exactly once per scan.
        let queue = Arc::new(Mutex::new(VecDeque::with_capacity(
            hosts.len() * self.config.ports.len(),
        )));
        {
            let mut q = queue.lock().await;
            for ip in &hosts {
                for port in &self.config.ports {
                    q.push_back(Target::new(*ip, *port));
                }
            }
        }

        let results = Arc::new(Mutex::new(Vec::new()));
        let stats = Arc::new(Mutex::new(ScanStats::default()));

        // Fixed pool: exactly `concurrency` workers, each popping from the
        // shared queue. This is the enforced upper bound on in-flight probes.
        let mut workers = Vec::with_capacity(self.config.concurrency);
        for _ in 0..self.config.concurrency {
            let queue = queue.clone();
            let results = results.clone();
            let stats = stats.clone();
            let probe = self.probe.clone();
            let cancel = self.cancel.clone();

            let worker = tokio::spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let target = { queue.lock().await.pop_front() };
                    let Some(target) = target else {
                        break;
                    };

                    match probe.probe(&target).await {
                        Ok(result) => {
                            stats.lock().await.record(result.state);
                            results.lock().await.push(result);
                        }
                        Err(e) => {
                            debug!(%target, error = %e, "probe unit failed");
                            stats.lock().await.record_failure();
                        }
                    }
                }
            });
            workers.push(worker);
        }

        // Join barrier: aggregation never runs before every worker is done.
        for worker in workers {
            if let Err(e) = worker.await {
                warn!("scan worker aborted: {e}");
            }
        }

        if self.cancel.is_cancelled() {
            return Err(SecureNetError::Cancelled);
        }

        let collected = { results.lock().await.clone() };
        let stats = { *stats.lock().await };

        let mut open_by_host: BTreeMap<IpAddr, Vec<u16>> = BTreeMap::new();
        for result in &collected {
            if result.is_open() {
                open_by_host
                    .entry(result.target.ip)
                    .or_default()
                    .push(result.target.port);
            }
        }

        let mut summaries = Vec::with_capacity(open_by_host.len());
        for (ip, mut ports) in open_by_host {
            ports.sort_unstable();
            ports.dedup();
            info!(host = %ip, ?ports, "discovered active host");
            summaries.push(HostSummary::new(ip, ports));
        }
        // Hosts with no open ports are presumed inactive and omitted.
        debug!(
            inactive = hosts.len() - summaries.len(),
            "hosts with no open ports omitted from report"
        );

        Ok(ScanReport::new(
            subnet.to_string(),
            summaries,
            stats,
            started.elapsed(),
        ))
    }
}
