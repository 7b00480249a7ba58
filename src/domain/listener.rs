//! Client-facing callback surface.
//!
//! Clients either drain the driver's [`WiimoteEvent`] channel themselves or
//! implement [`WiimoteListener`] and hand it to [`run_listener`], which
//! pumps the channel and routes every event to the matching method through
//! a static dispatch table. A panicking handler is caught and logged; it
//! never blocks later events and never touches the read loop.

use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::mpsc;
use tracing::warn;

use crate::domain::models::{ButtonId, ConnectionStatus, WiimoteEvent};

/// Callbacks for every driver event. All methods default to no-ops so a
/// client only implements what it cares about.
#[allow(unused_variables)]
pub trait WiimoteListener: Send {
    fn button_left_pressed(&mut self) {}
    fn button_right_pressed(&mut self) {}
    fn button_up_pressed(&mut self) {}
    fn button_down_pressed(&mut self) {}
    fn button_plus_pressed(&mut self) {}
    fn button_one_pressed(&mut self) {}
    fn button_two_pressed(&mut self) {}
    fn button_a_pressed(&mut self) {}
    fn button_b_pressed(&mut self) {}
    fn button_minus_pressed(&mut self) {}

    fn button_left_released(&mut self) {}
    fn button_right_released(&mut self) {}
    fn button_up_released(&mut self) {}
    fn button_down_released(&mut self) {}
    fn button_plus_released(&mut self) {}
    fn button_one_released(&mut self) {}
    fn button_two_released(&mut self) {}
    fn button_a_released(&mut self) {}
    fn button_b_released(&mut self) {}
    fn button_minus_released(&mut self) {}

    /// Calibrated accelerometer values, every axis in `[0, 1)`. An axis
    /// above its boundary is positive acceleration, below is negative.
    fn accelerometer(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        x_boundary: f64,
        y_boundary: f64,
        z_boundary: f64,
    ) {
    }

    fn connection_status(&mut self, status: ConnectionStatus) {}
}

/// Routes one event to the matching listener method.
pub fn dispatch<L: WiimoteListener + ?Sized>(listener: &mut L, event: &WiimoteEvent) {
    match event {
        WiimoteEvent::ButtonPressed(id) => match id {
            ButtonId::Left => listener.button_left_pressed(),
            ButtonId::Right => listener.button_right_pressed(),
            ButtonId::Up => listener.button_up_pressed(),
            ButtonId::Down => listener.button_down_pressed(),
            ButtonId::Plus => listener.button_plus_pressed(),
            ButtonId::One => listener.button_one_pressed(),
            ButtonId::Two => listener.button_two_pressed(),
            ButtonId::A => listener.button_a_pressed(),
            ButtonId::B => listener.button_b_pressed(),
            ButtonId::Minus => listener.button_minus_pressed(),
        },
        WiimoteEvent::ButtonReleased(id) => match id {
            ButtonId::Left => listener.button_left_released(),
            ButtonId::Right => listener.button_right_released(),
            ButtonId::Up => listener.button_up_released(),
            ButtonId::Down => listener.button_down_released(),
            ButtonId::Plus => listener.button_plus_released(),
            ButtonId::One => listener.button_one_released(),
            ButtonId::Two => listener.button_two_released(),
            ButtonId::A => listener.button_a_released(),
            ButtonId::B => listener.button_b_released(),
            ButtonId::Minus => listener.button_minus_released(),
        },
        WiimoteEvent::Motion(reading) => listener.accelerometer(
            reading.sample.x,
            reading.sample.y,
            reading.sample.z,
            reading.boundary.x,
            reading.boundary.y,
            reading.boundary.z,
        ),
        WiimoteEvent::Status(status) => listener.connection_status(*status),
    }
}

/// Drains the driver's event channel into `listener` until the driver
/// drops its sender. Each invocation is isolated: a panic in a handler is
/// logged and the pump keeps going.
pub async fn run_listener<L: WiimoteListener>(
    mut events: mpsc::UnboundedReceiver<WiimoteEvent>,
    mut listener: L,
) {
    while let Some(event) = events.recv().await {
        let outcome = catch_unwind(AssertUnwindSafe(|| dispatch(&mut listener, &event)));
        if outcome.is_err() {
            warn!(?event, "listener handler panicked; continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{MotionReading, MotionSample};

    #[derive(Default)]
    struct Recorder {
        a_pressed: usize,
        a_released: usize,
        motion: Vec<(f64, f64, f64)>,
        statuses: Vec<ConnectionStatus>,
    }

    impl WiimoteListener for Recorder {
        fn button_a_pressed(&mut self) {
            self.a_pressed += 1;
        }
        fn button_a_released(&mut self) {
            self.a_released += 1;
        }
        fn accelerometer(&mut self, x: f64, y: f64, z: f64, _bx: f64, _by: f64, _bz: f64) {
            self.motion.push((x, y, z));
        }
        fn connection_status(&mut self, status: ConnectionStatus) {
            self.statuses.push(status);
        }
    }

    #[test]
    fn dispatch_routes_each_event() {
        let mut recorder = Recorder::default();
        dispatch(&mut recorder, &WiimoteEvent::ButtonPressed(ButtonId::A));
        dispatch(&mut recorder, &WiimoteEvent::ButtonReleased(ButtonId::A));
        dispatch(
            &mut recorder,
            &WiimoteEvent::Motion(MotionReading {
                sample: MotionSample { x: 0.1, y: 0.2, z: 0.3 },
                boundary: MotionSample::default(),
            }),
        );
        dispatch(
            &mut recorder,
            &WiimoteEvent::Status(ConnectionStatus::Streaming),
        );

        assert_eq!(recorder.a_pressed, 1);
        assert_eq!(recorder.a_released, 1);
        assert_eq!(recorder.motion, vec![(0.1, 0.2, 0.3)]);
        assert_eq!(recorder.statuses, vec![ConnectionStatus::Streaming]);
    }

    struct Grumpy {
        delivered: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    impl WiimoteListener for Grumpy {
        fn button_a_pressed(&mut self) {
            panic!("client bug");
        }
        fn button_b_pressed(&mut self) {
            self.delivered
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn panicking_handler_does_not_stop_the_pump() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(WiimoteEvent::ButtonPressed(ButtonId::A)).unwrap();
        tx.send(WiimoteEvent::ButtonPressed(ButtonId::B)).unwrap();
        drop(tx);

        let delivered = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let listener = Grumpy {
            delivered: std::sync::Arc::clone(&delivered),
        };

        // The pump must survive the first handler's panic and still
        // deliver the second event before finishing.
        run_listener(rx, listener).await;
        assert_eq!(delivered.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
