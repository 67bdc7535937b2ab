//! Error taxonomy for SecureNet operations.
//!
//! Per-probe connection faults never appear here: the probe layer downgrades
//! them to `ProbeState::Closed`/`ProbeState::Error` and nothing below the
//! scan coordinator boundary surfaces upward. Capture faults, by contrast,
//! always propagate to the caller.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecureNetError {
    /// Host/port enumeration failed before any probe was dispatched.
    #[error("enumeration error: {0}")]
    Enumeration(String),

    /// The capture layer failed; the monitor stops and reports this.
    #[error("capture error: {0}")]
    Capture(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("operation cancelled")]
    Cancelled,
}

/// Result type alias for SecureNet operations
pub type SecureNetResult<T> = Result<T, SecureNetError>;
