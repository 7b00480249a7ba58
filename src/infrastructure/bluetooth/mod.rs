//! Bluetooth Module
//!
//! Drives the Wii Remote over two L2CAP channels supplied by the
//! transport collaborator.
//!
//! ## Modules
//!
//! - [`protocol`] - wire protocol: command encoding, report decoding,
//!   button bit tables, sample normalization
//! - [`scanner`] - device discovery against the known-model allow-list
//! - [`connection`] - channel establishment and handshake
//! - [`service`] - main driver coordinator

pub mod connection;
pub mod protocol;
pub mod scanner;
pub mod service;

// Re-export main service for convenience
pub use service::WiimoteDriver;
