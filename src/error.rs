//! Error taxonomy for the driver.
//!
//! Connection-phase failures come back to the caller as explicit results.
//! A [`DriverError::Read`] is fatal to the streaming loop; a
//! [`DriverError::Write`] is reported to the caller but leaves an active
//! stream untouched.

use thiserror::Error;

/// Failures raised by the transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The channel was closed underneath a pending operation, e.g. by
    /// `disconnect()` while the read loop was blocked in `receive`.
    #[error("channel closed")]
    Closed,

    #[error("scan failed: {0}")]
    Scan(String),
}

/// Errors surfaced by the driver's public API.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("device discovery failed")]
    Discovery(#[source] TransportError),

    /// Channel open or handshake write failed. Any partially opened
    /// channel has already been closed; no partial state is retained.
    #[error("connection failed")]
    Connection(#[source] TransportError),

    /// Fatal receive failure; the streaming loop has terminated.
    #[error("read failure on data channel")]
    Read(#[source] TransportError),

    /// A command send failed. An active stream keeps running.
    #[error("command write failed")]
    Write(#[source] TransportError),

    #[error("invalid report: expected {expected} bytes, got {got}")]
    Decode { expected: usize, got: usize },

    #[error("not connected")]
    NotConnected,
}
