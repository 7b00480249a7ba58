//! Abstract wireless transport.
//!
//! The driver does not implement the wireless stack; it is handed a
//! collaborator that can scan for nearby devices and open a byte-oriented
//! duplex channel to an address + L2CAP PSM. Anything satisfying these
//! traits will do: a BlueZ socket wrapper in production, an in-memory fake
//! in the test suite.

use std::future::Future;

use crate::domain::models::DeviceAddress;
use crate::error::TransportError;

/// A device candidate reported by one scan round. `name` is `None` when
/// the friendly-name lookup failed; such candidates are skipped during
/// discovery rather than treated as errors.
#[derive(Debug, Clone)]
pub struct RemoteDevice {
    pub address: DeviceAddress,
    pub name: Option<String>,
}

/// A packet-oriented duplex byte channel to the device.
///
/// `send` and `receive` take `&self` (in the manner of tokio's socket
/// APIs) so a command write can proceed while the read loop sits blocked
/// in `receive` on the same channel.
pub trait DuplexChannel: Send + Sync + 'static {
    /// Write one outbound packet.
    fn send(&self, payload: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receive one inbound packet into `buf`, returning its length.
    /// Unblocks with [`TransportError::Closed`] when the channel is
    /// closed underneath it.
    fn receive(&self, buf: &mut [u8])
        -> impl Future<Output = Result<usize, TransportError>> + Send;

    /// Close the channel. Idempotent.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// The transport collaborator: device inquiry plus channel establishment.
pub trait Transport: Send + Sync + 'static {
    type Channel: DuplexChannel;

    /// Run one inquiry round and report every candidate seen. An empty
    /// vec is a completed round with no matches, not an error.
    fn scan(&self) -> impl Future<Output = Result<Vec<RemoteDevice>, TransportError>> + Send;

    /// Open a duplex channel to `address` on the given L2CAP PSM.
    fn open(
        &self,
        address: DeviceAddress,
        psm: u16,
    ) -> impl Future<Output = Result<Self::Channel, TransportError>> + Send;
}
