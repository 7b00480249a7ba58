//! Button edge detection.
//!
//! The remote reports a button as a bitmask on every report cycle while it
//! is held, far faster than once per 300ms. Each button therefore gets a
//! small state machine that collapses the per-cycle activations into a
//! single logical press, and a release monitor that notices when the
//! refreshes stop.

use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch, Notify};
use tokio::time::{sleep, Duration, Instant};
use tracing::trace;

use crate::domain::models::{ButtonId, WiimoteEvent};

/// Repeated activations inside this window belong to one logical press;
/// a window elapsing with no refresh means the button was released.
/// Protocol-tuned against observed device timing; do not change.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Poll granularity of the release monitors. Protocol-tuned.
pub const MONITOR_POLL: Duration = Duration::from_millis(100);

/// State shared between the read loop and the button's release monitor.
/// All transitions happen under the one mutex, and the matching event is
/// sent before the lock drops, so the per-button event order always
/// matches the transition order.
#[derive(Default)]
struct ButtonCell {
    /// When the read loop last saw this button's bitmask. `None` until
    /// the first activation of the session.
    last_refresh: Option<Instant>,
    /// Whether the monitor currently tracks an open press.
    active: bool,
}

/// Edge detector for one physical button.
///
/// The read loop calls [`refresh`](Self::refresh) on each cycle whose
/// report carried the button's bitmask. A long-lived monitor task, parked
/// on a [`Notify`] between presses, emits the matching Released once the
/// refreshes stop. Monitors are bounded at one task per button and are
/// cancelled through the shared shutdown signal when the connection drops.
pub struct ButtonEdgeDetector {
    id: ButtonId,
    cell: Arc<Mutex<ButtonCell>>,
    wake: Arc<Notify>,
    events: mpsc::UnboundedSender<WiimoteEvent>,
}

impl ButtonEdgeDetector {
    /// Creates the detector and spawns its release monitor. The monitor
    /// lives until `shutdown` fires or the event receiver is dropped.
    pub fn spawn(
        id: ButtonId,
        events: mpsc::UnboundedSender<WiimoteEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let cell = Arc::new(Mutex::new(ButtonCell::default()));
        let wake = Arc::new(Notify::new());

        tokio::spawn(run_monitor(
            id,
            Arc::clone(&cell),
            Arc::clone(&wake),
            events.clone(),
            shutdown,
        ));

        Self {
            id,
            cell,
            wake,
            events,
        }
    }

    /// Called once per report cycle when this button's bit pattern matched
    /// the cycle's byte-group value.
    ///
    /// Always stores the current instant. A refresh inside the debounce
    /// window of an open press emits nothing; the monitor observes the
    /// fresh timestamp and keeps waiting. Anything else counts as a new
    /// activation: Pressed is emitted and the monitor is woken.
    pub fn refresh(&self) {
        let now = Instant::now();
        let mut cell = self.cell.lock().unwrap();
        let dt = cell.last_refresh.map(|t| now.duration_since(t));
        cell.last_refresh = Some(now);
        if cell.active && matches!(dt, Some(d) if d < DEBOUNCE) {
            return;
        }
        let was_idle = !cell.active;
        cell.active = true;

        // Emitted under the cell lock. The send never blocks, and keeping
        // the transition and the event atomic means a Pressed for a new
        // press cannot overtake the monitor's Released for the previous
        // one on another worker thread.
        trace!(button = %self.id, "press edge");
        let _ = self.events.send(WiimoteEvent::ButtonPressed(self.id));
        if was_idle {
            self.wake.notify_one();
        }
    }
}

/// Release monitor for one button. Parks between presses; while a press
/// is open, polls every [`MONITOR_POLL`] until a full debounce window
/// passes with no refresh, then emits Released and parks again.
async fn run_monitor(
    id: ButtonId,
    cell: Arc<Mutex<ButtonCell>>,
    wake: Arc<Notify>,
    events: mpsc::UnboundedSender<WiimoteEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        tokio::select! {
            biased;
            _ = shutdown.changed() => return,
            _ = wake.notified() => {}
        }

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => return,
                _ = sleep(MONITOR_POLL) => {}
            }

            let released = {
                let mut cell = cell.lock().unwrap();
                let idle_for = cell
                    .last_refresh
                    .map(|t| Instant::now().duration_since(t))
                    .unwrap_or(DEBOUNCE);
                if idle_for >= DEBOUNCE {
                    cell.active = false;
                    // Same lock discipline as refresh: the Released must
                    // land before any Pressed a concurrent refresh emits
                    // for the button's next activation.
                    trace!(button = %id, "release edge");
                    let _ = events.send(WiimoteEvent::ButtonReleased(id));
                    true
                } else {
                    false
                }
            };

            if released {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn detector(
        id: ButtonId,
    ) -> (
        ButtonEdgeDetector,
        mpsc::UnboundedReceiver<WiimoteEvent>,
        watch::Sender<bool>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let det = ButtonEdgeDetector::spawn(id, tx, shutdown_rx);
        (det, rx, shutdown_tx)
    }

    #[tokio::test(start_paused = true)]
    async fn first_refresh_emits_pressed() {
        let (det, mut rx, _shutdown) = detector(ButtonId::A);
        det.refresh();
        assert_eq!(rx.recv().await, Some(WiimoteEvent::ButtonPressed(ButtonId::A)));
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_inside_window_collapse_into_one_press() {
        let (det, mut rx, _shutdown) = detector(ButtonId::A);

        // Three activations 50ms apart: one logical press.
        for _ in 0..3 {
            det.refresh();
            advance(Duration::from_millis(50)).await;
        }
        assert_eq!(rx.recv().await, Some(WiimoteEvent::ButtonPressed(ButtonId::A)));

        // 400ms with no refresh: exactly one Released.
        advance(Duration::from_millis(400)).await;
        assert_eq!(
            rx.recv().await,
            Some(WiimoteEvent::ButtonReleased(ButtonId::A))
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn released_only_after_full_window() {
        let (det, mut rx, _shutdown) = detector(ButtonId::Up);
        det.refresh();
        assert_eq!(rx.recv().await, Some(WiimoteEvent::ButtonPressed(ButtonId::Up)));

        // Keep refreshing every 100ms; no release may appear.
        for _ in 0..5 {
            advance(Duration::from_millis(100)).await;
            det.refresh();
        }
        assert!(rx.try_recv().is_err());

        advance(Duration::from_millis(400)).await;
        assert_eq!(
            rx.recv().await,
            Some(WiimoteEvent::ButtonReleased(ButtonId::Up))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn press_after_release_emits_again() {
        let (det, mut rx, _shutdown) = detector(ButtonId::B);
        det.refresh();
        assert_eq!(rx.recv().await, Some(WiimoteEvent::ButtonPressed(ButtonId::B)));
        advance(Duration::from_millis(400)).await;
        assert_eq!(
            rx.recv().await,
            Some(WiimoteEvent::ButtonReleased(ButtonId::B))
        );

        det.refresh();
        assert_eq!(rx.recv().await, Some(WiimoteEvent::ButtonPressed(ButtonId::B)));
        advance(Duration::from_millis(400)).await;
        assert_eq!(
            rx.recv().await,
            Some(WiimoteEvent::ButtonReleased(ButtonId::B))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn events_alternate_strictly_across_rapid_re_press() {
        let (det, mut rx, _shutdown) = detector(ButtonId::Two);

        // Press, let the monitor time the press out, and re-press right
        // at the boundary. The stream must stay strictly alternating:
        // the old press's Released before the new press's Pressed.
        det.refresh();
        advance(Duration::from_millis(400)).await;
        det.refresh();
        advance(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                WiimoteEvent::ButtonPressed(ButtonId::Two),
                WiimoteEvent::ButtonReleased(ButtonId::Two),
                WiimoteEvent::ButtonPressed(ButtonId::Two),
                WiimoteEvent::ButtonReleased(ButtonId::Two),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_open_monitor() {
        let (det, mut rx, shutdown) = detector(ButtonId::One);
        det.refresh();
        assert_eq!(
            rx.recv().await,
            Some(WiimoteEvent::ButtonPressed(ButtonId::One))
        );

        shutdown.send(true).unwrap();
        // Let the monitor observe the signal, then verify no Released
        // ever arrives.
        tokio::task::yield_now().await;
        advance(Duration::from_millis(1000)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
