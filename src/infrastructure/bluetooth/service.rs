//! Driver service.
//!
//! The session object a client owns: it coordinates discovery,
//! connection, the streaming read loop and outgoing commands, and feeds
//! raw reports through the button edge detectors and the motion filter.
//! Resulting events go out an unbounded mpsc channel, so the read loop
//! never blocks on a slow client.

use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::domain::buttons::ButtonEdgeDetector;
use crate::domain::models::{
    ButtonId, ConnectionStatus, MotionSample, Sensitivity, WiimoteEvent,
};
use crate::domain::motion::MotionFilter;
use crate::error::DriverError;
use crate::infrastructure::bluetooth::connection::{self, ConnectionHandle};
use crate::infrastructure::bluetooth::protocol::{self, Command, REPORT_LEN};
use crate::infrastructure::bluetooth::scanner::DeviceLocator;
use crate::infrastructure::transport::{DuplexChannel, RemoteDevice, Transport};

/// Connection-scoped state: channels, the per-button detectors with
/// their monitor tasks, and the shutdown signal that cancels them.
struct Session<C> {
    handle: ConnectionHandle<C>,
    buttons: Arc<[ButtonEdgeDetector; 10]>,
    shutdown: watch::Sender<bool>,
}

/// Wii Remote driver session.
///
/// Exactly one device at a time. Constructed with the transport
/// collaborator, the accelerometer sensitivity and the event sink;
/// torn down with [`disconnect`](Self::disconnect).
pub struct WiimoteDriver<T: Transport> {
    transport: Arc<T>,
    locator: DeviceLocator<T>,
    events: mpsc::UnboundedSender<WiimoteEvent>,
    sensitivity: Sensitivity,
    session: Mutex<Option<Session<T::Channel>>>,
    status: Mutex<ConnectionStatus>,
    boundary: Mutex<Option<MotionSample>>,
}

impl<T: Transport> WiimoteDriver<T> {
    pub fn new(
        transport: Arc<T>,
        sensitivity: Sensitivity,
        events: mpsc::UnboundedSender<WiimoteEvent>,
    ) -> Self {
        Self {
            locator: DeviceLocator::new(Arc::clone(&transport)),
            transport,
            events,
            sensitivity,
            session: Mutex::new(None),
            status: Mutex::new(ConnectionStatus::Disconnected),
            boundary: Mutex::new(None),
        }
    }

    /// Delay between discovery scan rounds when no remote turned up.
    pub fn with_scan_retry_delay(mut self, delay: Duration) -> Self {
        self.locator = self.locator.with_retry_delay(delay);
        self
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.lock().unwrap()
    }

    /// The stream's frozen calibration boundary. `None` until the first
    /// ten cycles of [`listen`](Self::listen) have completed; reset when
    /// a new connection starts a fresh calibration.
    pub fn boundary(&self) -> Option<MotionSample> {
        *self.boundary.lock().unwrap()
    }

    /// Scan until a known remote turns up. Blocks the caller across scan
    /// rounds; cancel by dropping the future.
    pub async fn discover(&self) -> Result<RemoteDevice, DriverError> {
        self.set_status(ConnectionStatus::Discovering);
        match self.locator.discover().await {
            Ok(device) => {
                self.set_status(ConnectionStatus::Discovered);
                Ok(device)
            }
            Err(e) => {
                self.set_status(ConnectionStatus::Disconnected);
                Err(e)
            }
        }
    }

    /// Open both channels to `device` and run the handshake. Replaces
    /// any previous session. On failure nothing stays open.
    pub async fn connect(&self, device: &RemoteDevice) -> Result<(), DriverError> {
        self.disconnect().await;

        let handle = match connection::establish(self.transport.as_ref(), device).await {
            Ok(handle) => handle,
            Err(e) => {
                self.set_status(ConnectionStatus::Disconnected);
                return Err(e);
            }
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let events = &self.events;
        let buttons = Arc::new(
            ButtonId::ALL.map(|id| ButtonEdgeDetector::spawn(id, events.clone(), shutdown_rx.clone())),
        );

        *self.session.lock().unwrap() = Some(Session {
            handle,
            buttons,
            shutdown: shutdown_tx,
        });
        *self.boundary.lock().unwrap() = None;
        self.set_status(ConnectionStatus::Connected);
        Ok(())
    }

    /// Close both channels and cancel the button monitors. Idempotent.
    /// A `listen` blocked in receive unblocks with a channel-closed
    /// error and ends cleanly.
    pub async fn disconnect(&self) {
        let session = self.session.lock().unwrap().take();
        let Some(session) = session else {
            return;
        };

        let _ = session.shutdown.send(true);
        session.handle.control.close().await;
        session.handle.data.close().await;

        info!("disconnected");
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Streaming read loop.
    ///
    /// One blocking receive per cycle, fully ordered. The first ten
    /// cycles only feed calibration; they produce no button or motion
    /// events. Terminates with `Ok` when `disconnect` closed the channel,
    /// or with [`DriverError::Read`] on an unrecoverable receive failure
    /// (logged, session torn down, no automatic reconnect).
    pub async fn listen(&self) -> Result<(), DriverError> {
        let (data, buttons, mut shutdown_rx) = {
            let guard = self.session.lock().unwrap();
            let session = guard.as_ref().ok_or(DriverError::NotConnected)?;
            (
                Arc::clone(&session.handle.data),
                Arc::clone(&session.buttons),
                session.shutdown.subscribe(),
            )
        };

        self.set_status(ConnectionStatus::Streaming);
        info!("receiving...");

        let mut motion = MotionFilter::new(self.sensitivity);
        let mut buf = [0u8; REPORT_LEN];

        loop {
            let n = match data.receive(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    if *shutdown_rx.borrow_and_update() {
                        info!("streaming ended by disconnect");
                        return Ok(());
                    }
                    error!(error = %e, "unrecoverable read failure, ending stream");
                    self.disconnect().await;
                    return Err(DriverError::Read(e));
                }
            };

            let frame = match protocol::decode_report(&buf[..n]) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "skipping malformed report");
                    continue;
                }
            };

            let sample = MotionSample {
                x: protocol::normalize_sample(frame.accel[0]),
                y: protocol::normalize_sample(frame.accel[1]),
                z: protocol::normalize_sample(frame.accel[2]),
            };

            // Calibration cycles establish the rest baseline and nothing
            // else; button bits in those reports are ignored.
            if motion.is_calibrating() {
                motion.calibrate(sample);
                if !motion.is_calibrating() {
                    *self.boundary.lock().unwrap() = Some(motion.boundary());
                }
                continue;
            }

            if let Some(id) = protocol::button_in_group_a(frame.buttons_a) {
                buttons[id.index()].refresh();
            }
            if let Some(id) = protocol::button_in_group_b(frame.buttons_b) {
                buttons[id.index()].refresh();
            }

            if let Some(reading) = motion.process(sample) {
                let _ = self.events.send(WiimoteEvent::Motion(reading));
            }
        }
    }

    /// Start the rumble motor. With a non-zero `duration` a detached
    /// task turns it off again after the delay, so a rumble triggered
    /// from a client callback never stalls packet reception.
    pub async fn rumble_on(&self, duration: Duration) -> Result<(), DriverError> {
        let data = self.data_channel()?;
        data.send(&Command::Rumble(true).encode())
            .await
            .map_err(DriverError::Write)?;

        if !duration.is_zero() {
            tokio::spawn(async move {
                sleep(duration).await;
                if let Err(e) = data.send(&Command::Rumble(false).encode()).await {
                    warn!(error = %e, "rumble auto-off write failed");
                }
            });
        }
        Ok(())
    }

    /// Stop the rumble motor.
    pub async fn rumble_off(&self) -> Result<(), DriverError> {
        let data = self.data_channel()?;
        data.send(&Command::Rumble(false).encode())
            .await
            .map_err(DriverError::Write)
    }

    fn data_channel(&self) -> Result<Arc<T::Channel>, DriverError> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|session| Arc::clone(&session.handle.data))
            .ok_or(DriverError::NotConnected)
    }

    fn set_status(&self, status: ConnectionStatus) {
        *self.status.lock().unwrap() = status;
        let _ = self.events.send(WiimoteEvent::Status(status));
    }
}
