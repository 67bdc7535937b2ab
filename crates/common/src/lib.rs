//! SecureNet Common - Shared types and traits
//!
//! This crate provides the core types, traits, and error taxonomy used
//! across the SecureNet crates: probe/scan results on the scanning side,
//! packet records and alerts on the monitoring side, and the configuration
//! values that are threaded into each component at construction.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{SecureNetError, SecureNetResult};
pub use traits::{CaptureSource, PermissionGate, Probe};
pub use types::{
    tcp_flags, Alert, AlertPolicy, Classification, HostSummary, MonitorConfig, PacketRecord,
    ProbeResult, ProbeState, ScanConfig, ScanReport, ScanStats, SecurityReport, Target,
    TransportProtocol, DEFAULT_PORTS,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
