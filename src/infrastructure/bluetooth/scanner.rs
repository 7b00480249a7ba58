//! Device discovery.
//!
//! Runs inquiry rounds through the transport collaborator until a
//! candidate's friendly name exactly matches the known-model allow-list.

use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

use crate::error::DriverError;
use crate::infrastructure::bluetooth::protocol;
use crate::infrastructure::transport::{RemoteDevice, Transport};

/// Discovers a Wii Remote through the transport's scan facility.
pub struct DeviceLocator<T> {
    transport: Arc<T>,
    retry_delay: Duration,
}

impl<T: Transport> DeviceLocator<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            retry_delay: Duration::from_millis(1000),
        }
    }

    /// Delay between scan rounds when nothing matched.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Scan until a known remote turns up.
    ///
    /// Retries empty rounds indefinitely; the caller cancels by dropping
    /// the future. Candidates whose name could not be resolved are
    /// skipped, not treated as failures. A transport-level scan failure
    /// ends discovery with [`DriverError::Discovery`].
    pub async fn discover(&self) -> Result<RemoteDevice, DriverError> {
        info!("scanning for a known remote...");
        loop {
            let round = self
                .transport
                .scan()
                .await
                .map_err(DriverError::Discovery)?;

            for candidate in round {
                match candidate.name.as_deref() {
                    Some(name) if protocol::is_known_model(name) => {
                        info!(%candidate.address, name, "remote found");
                        return Ok(candidate);
                    }
                    Some(name) => debug!(name, "discarding candidate"),
                    None => debug!("discarding candidate with unresolved name"),
                }
            }

            debug!("scan round finished without a match, retrying");
            sleep(self.retry_delay).await;
        }
    }
}
