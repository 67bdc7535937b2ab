//! SecureNet Scanner - concurrent subnet discovery
//!
//! The scan pipeline: a CIDR prefix is expanded into its usable host range
//! (`hosts`), crossed with a port list, and drained by a fixed-size worker
//! pool of TCP connect probes (`probe`, `coordinator`). Results are grouped
//! per host behind a join barrier; only hosts with open ports survive into
//! the report. A `ping` sweep helper covers the quick-liveness case.

pub mod coordinator;
pub mod hosts;
pub mod ping;
pub mod probe;

pub use coordinator::ScanCoordinator;
pub use hosts::{usable_host_count, HostRange};
pub use ping::PingSweep;
pub use probe::TcpProbe;
