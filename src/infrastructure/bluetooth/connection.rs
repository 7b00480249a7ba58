//! Connection establishment.
//!
//! Opens the control and data channels and runs the handshake. Any
//! failure along the way closes whatever was already open; a failed
//! `establish` leaves no partial state behind.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::DeviceAddress;
use crate::error::DriverError;
use crate::infrastructure::bluetooth::protocol::{
    self, Command, CONTROL_PSM, DATA_PSM,
};
use crate::infrastructure::transport::{DuplexChannel, RemoteDevice, Transport};

/// Both channels of an established connection. Owned by the driver;
/// created here, destroyed by `disconnect()` or a terminal read failure.
pub struct ConnectionHandle<C> {
    pub address: DeviceAddress,
    pub control: Arc<C>,
    pub data: Arc<C>,
}

/// Open both channels and run the handshake.
///
/// Channel order and handshake order are fixed by the protocol: control
/// (PSM 0x11), data (PSM 0x13), then the pairing payload on control,
/// LED slot 1 and report mode on data.
pub async fn establish<T: Transport>(
    transport: &T,
    device: &RemoteDevice,
) -> Result<ConnectionHandle<T::Channel>, DriverError> {
    info!(address = %device.address, "connecting...");

    let control = transport
        .open(device.address, CONTROL_PSM)
        .await
        .map_err(DriverError::Connection)?;

    let data = match transport.open(device.address, DATA_PSM).await {
        Ok(channel) => channel,
        Err(e) => {
            warn!("data channel failed to open, rolling back control channel");
            control.close().await;
            return Err(DriverError::Connection(e));
        }
    };

    if let Err(e) = handshake(&control, &data, device).await {
        warn!("handshake failed, closing both channels");
        control.close().await;
        data.close().await;
        return Err(e);
    }

    info!(address = %device.address, "connection established");
    Ok(ConnectionHandle {
        address: device.address,
        control: Arc::new(control),
        data: Arc::new(data),
    })
}

async fn handshake<C: DuplexChannel>(
    control: &C,
    data: &C,
    device: &RemoteDevice,
) -> Result<(), DriverError> {
    control
        .send(&protocol::pairing_payload(&device.address))
        .await
        .map_err(DriverError::Connection)?;

    info!("turning on led 1");
    data.send(&Command::SetLed(1).encode())
        .await
        .map_err(DriverError::Connection)?;

    info!("changing report mode");
    data.send(&Command::SetReportMode.encode())
        .await
        .map_err(DriverError::Connection)?;

    Ok(())
}
