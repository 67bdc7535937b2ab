//! SecureNet Monitor - passive traffic inspection
//!
//! A capture source delivers decoded packets in arrival order; the threat
//! monitor counts and classifies each one and raises alerts when the volume
//! threshold is crossed. Alert history is a bounded ring; reports are
//! lock-light snapshots safe to take while the stream is still flowing.

pub mod classify;
pub mod monitor;
pub mod source;

pub use classify::classify;
pub use monitor::{MonitorPhase, ThreatMonitor};
pub use source::{decode_frame, LiveCapture, ReplaySource};
