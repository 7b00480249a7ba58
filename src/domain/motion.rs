//! Accelerometer calibration and sensitivity filtering.
//!
//! The first ten streaming cycles establish the rest baseline (the
//! "calibration boundary"); after that the filter decides, per sensitivity
//! setting, which samples are worth surfacing to the client.

use tracing::debug;

use crate::domain::models::{MotionReading, MotionSample, Sensitivity};

/// Number of streaming cycles consumed by calibration. The boundary is
/// whatever the last of these cycles reported, not an average.
pub const CALIBRATION_CYCLES: usize = 10;

/// Per-session motion filter.
///
/// Starts in the calibrating phase; [`calibrate`](Self::calibrate) must be
/// fed the first [`CALIBRATION_CYCLES`] samples, each overwriting the
/// boundary. The tenth freezes it for the session's lifetime and seeds the
/// previous-sample baseline, after which [`process`](Self::process) takes
/// over.
pub struct MotionFilter {
    sensitivity: f64,
    boundary: MotionSample,
    /// Previous cycle's sample; tracks every processed cycle whether or
    /// not it was emitted, matching the device's observed behavior.
    last: MotionSample,
    cycles_seen: usize,
}

impl MotionFilter {
    pub fn new(sensitivity: Sensitivity) -> Self {
        Self {
            sensitivity: sensitivity.fraction(),
            boundary: MotionSample::default(),
            last: MotionSample::default(),
            cycles_seen: 0,
        }
    }

    /// True until the boundary has been frozen.
    pub fn is_calibrating(&self) -> bool {
        self.cycles_seen < CALIBRATION_CYCLES
    }

    /// The rest baseline. Meaningful once calibration has finished.
    pub fn boundary(&self) -> MotionSample {
        self.boundary
    }

    /// Feed one calibration cycle. Must only be called while
    /// [`is_calibrating`](Self::is_calibrating) is true.
    pub fn calibrate(&mut self, sample: MotionSample) {
        self.boundary = sample;
        self.cycles_seen += 1;
        if !self.is_calibrating() {
            self.last = self.boundary;
            debug!(
                x = self.boundary.x,
                y = self.boundary.y,
                z = self.boundary.z,
                "calibration boundary frozen"
            );
        }
    }

    /// Decide whether a post-calibration sample is surfaced.
    ///
    /// With sensitivity off, every sample is. Otherwise a sample passes
    /// only when every axis independently lies strictly outside the band
    /// `[prev * (1 - s), prev * (1 + s)]` around the previous cycle's
    /// value. Requiring all three axes to move together is deliberately
    /// kept from the device's established behavior, even though an
    /// any-axis trigger would be the more common semantic.
    pub fn process(&mut self, sample: MotionSample) -> Option<MotionReading> {
        let prev = self.last;
        self.last = sample;

        let emit = if self.sensitivity == 0.0 {
            true
        } else {
            outside_band(sample.x, prev.x, self.sensitivity)
                && outside_band(sample.y, prev.y, self.sensitivity)
                && outside_band(sample.z, prev.z, self.sensitivity)
        };

        emit.then_some(MotionReading {
            sample,
            boundary: self.boundary,
        })
    }
}

fn outside_band(value: f64, prev: f64, s: f64) -> bool {
    value > prev * (1.0 + s) || value < prev * (1.0 - s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f64, y: f64, z: f64) -> MotionSample {
        MotionSample { x, y, z }
    }

    fn calibrated(sensitivity: Sensitivity, boundary: MotionSample) -> MotionFilter {
        let mut filter = MotionFilter::new(sensitivity);
        // Nine throwaway cycles, then the one that sticks.
        for _ in 0..CALIBRATION_CYCLES - 1 {
            filter.calibrate(sample(0.9, 0.9, 0.9));
        }
        filter.calibrate(boundary);
        filter
    }

    #[test]
    fn boundary_is_tenth_sample_not_average() {
        let mut filter = MotionFilter::new(Sensitivity::Off);
        for i in 0..CALIBRATION_CYCLES {
            assert!(filter.is_calibrating());
            filter.calibrate(sample(i as f64 / 100.0, 0.2, 0.3));
        }
        assert!(!filter.is_calibrating());
        assert_eq!(filter.boundary(), sample(0.09, 0.2, 0.3));
    }

    #[test]
    fn sensitivity_off_emits_every_cycle() {
        let boundary = sample(0.5, 0.5, 0.5);
        let mut filter = calibrated(Sensitivity::Off, boundary);
        for _ in 0..5 {
            let reading = filter.process(sample(0.5, 0.5, 0.5)).unwrap();
            assert_eq!(reading.sample, sample(0.5, 0.5, 0.5));
            assert_eq!(reading.boundary, boundary);
        }
    }

    #[test]
    fn all_axes_must_leave_the_band() {
        let boundary = sample(0.5, 0.5, 0.5);
        let mut filter = calibrated(Sensitivity::Low, boundary);

        // Two axes outside the 10% band, one inside: no event.
        assert!(filter.process(sample(0.6, 0.6, 0.5)).is_none());

        // Baseline is now (0.6, 0.6, 0.5); all three axes outside.
        let reading = filter.process(sample(0.7, 0.7, 0.6)).unwrap();
        assert_eq!(reading.sample, sample(0.7, 0.7, 0.6));
        assert_eq!(reading.boundary, boundary);
    }

    #[test]
    fn band_edges_are_exclusive() {
        let boundary = sample(0.5, 0.5, 0.5);
        let mut filter = calibrated(Sensitivity::Low, boundary);
        // Exactly on the upper band edge on every axis: inside, no event.
        assert!(filter
            .process(sample(0.55, 0.55, 0.55))
            .is_none());
    }

    #[test]
    fn baseline_tracks_suppressed_samples() {
        let mut filter = calibrated(Sensitivity::Low, sample(0.5, 0.5, 0.5));

        // Suppressed, but the baseline moves to (0.54, 0.5, 0.5).
        assert!(filter.process(sample(0.54, 0.5, 0.5)).is_none());

        // Relative to the frozen boundary this would pass, but relative to
        // the updated baseline the x axis stays inside its band.
        assert!(filter.process(sample(0.57, 0.6, 0.6)).is_none());
    }
}
