//! Wii Remote driver
//!
//! Turns a raw bidirectional byte-stream transport to a Wii Remote into a
//! typed event stream: button Pressed/Released events and calibrated
//! acceleration samples. The crate owns the wire protocol, the connection
//! handshake, button edge detection and accelerometer calibration; the
//! wireless stack itself is an external collaborator supplied through the
//! [`Transport`] trait.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     WiimoteDriver                        │
//! │   (session coordinator - public API for the client)      │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌───────────┐  ┌────────────┐  ┌──────────┐
//! │  Scanner  │  │ Connection │  │ Protocol │
//! │           │  │            │  │          │
//! │ - device  │  │ - channels │  │ - codec  │
//! │   lookup  │  │ - handshake│  │ - tables │
//! └───────────┘  └────────────┘  └──────────┘
//!         │             │             │
//!         └─────────────┼─────────────┘
//!                       ▼
//!          ┌─────────────────────────┐
//!          │  domain: buttons/motion │
//!          │  edge detect, filtering │
//!          └─────────────────────────┘
//! ```
//!
//! Events reach the client over a `tokio::sync::mpsc` channel as
//! [`WiimoteEvent`] values, or through the [`WiimoteListener`] callback
//! surface driven by [`run_listener`].

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::listener::{dispatch, run_listener, WiimoteListener};
pub use domain::models::{
    ButtonId, ConnectionStatus, DeviceAddress, MotionReading, MotionSample, ReportFrame,
    Sensitivity, WiimoteEvent,
};
pub use domain::settings::{LogSettings, Settings, SettingsService};
pub use error::{DriverError, TransportError};
pub use infrastructure::bluetooth::service::WiimoteDriver;
pub use infrastructure::logging::{init_logger, LoggingGuard};
pub use infrastructure::transport::{DuplexChannel, RemoteDevice, Transport};
