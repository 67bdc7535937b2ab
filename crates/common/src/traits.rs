//! Core traits at the seams between SecureNet components.

use crate::error::SecureNetResult;
use crate::types::{PacketRecord, ProbeResult, Target};
use async_trait::async_trait;

/// One connection attempt to a single (host, port) pair.
///
/// Implementations downgrade connection faults to `ProbeState` values; an
/// `Err` from this trait means the probe unit itself could not run, and the
/// coordinator counts it as an error without aborting the scan.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe a single target, at most once. No retries.
    async fn probe(&self, target: &Target) -> SecureNetResult<ProbeResult>;

    /// Probe name/identifier
    fn name(&self) -> &str;
}

/// Ordered delivery of decoded packets with a terminal signal.
///
/// `Ok(None)` is a clean end of stream; `Err` is a capture-layer fault. The
/// monitor owns the source for the lifetime of its `Running` state and drops
/// it on every exit path. No random access or rewind is required.
pub trait CaptureSource: Send {
    fn next_packet(&mut self) -> SecureNetResult<Option<PacketRecord>>;

    /// Human-readable description of where packets come from.
    fn describe(&self) -> String;
}

/// External authorization check consulted before privileged operations.
/// The core never mutates permission state through this interface.
pub trait PermissionGate: Send + Sync {
    fn has_permission(&self, username: &str, permission: &str) -> bool;

    fn current_role(&self, username: &str) -> Option<String>;
}
