//! Calibration engine: pinhole-model solving for focal length and iris size.
//!
//! Both procedures share one sampling protocol: at a fixed cadence, measure
//! both irises, reject gaze-asymmetric frames, and accept the mean diameter.
//! The accepted-sample median then feeds the pinhole relation
//! `apparent_px = focal_px * real_cm / distance_cm`, solved for whichever
//! quantity is unknown while the subject holds the reference distance.

use crate::{
    circle_fit::{measure_iris, IrisMeasurement},
    config::Config,
    constants::{DEFAULT_IRIS_DIAMETER_CM, MIN_DIAMETER_PX},
    detector::LandmarkSource,
    landmarks::iris_ring_points,
    Result,
};
use std::time::{Duration, Instant};

/// Which calibration procedure is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationKind {
    /// Solve the pinhole model for focal length at the reference distance
    FocalLength,
    /// Solve the pinhole model for the personal iris diameter
    IrisDiameter,
}

/// Calibration constants applied by the per-frame estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationConstants {
    /// Camera focal length in pixels, unset until calibrated
    pub focal_length_px: Option<f64>,
    /// Personal iris diameter in centimeters
    pub iris_diameter_cm: f64,
}

impl Default for CalibrationConstants {
    fn default() -> Self {
        Self {
            focal_length_px: None,
            iris_diameter_cm: DEFAULT_IRIS_DIAMETER_CM,
        }
    }
}

impl CalibrationConstants {
    /// Restore startup defaults: focal length unset, stock iris diameter
    pub fn reset(&mut self, default_iris_diameter_cm: f64) {
        self.focal_length_px = None;
        self.iris_diameter_cm = default_iris_diameter_cm;
    }
}

/// Left/right apparent-diameter asymmetry ratio
///
/// Off-axis gaze projects the iris as an ellipse, shrinking one apparent
/// diameter relative to the other; the ratio exposes that asymmetry.
#[must_use]
pub fn gaze_ratio(left_diameter_px: f64, right_diameter_px: f64) -> f64 {
    let larger = left_diameter_px.max(right_diameter_px);
    let smaller = left_diameter_px.min(right_diameter_px);
    larger / smaller.max(MIN_DIAMETER_PX)
}

/// Solve the pinhole relation for focal length at a known distance and size
#[must_use]
pub fn solve_focal_length_px(median_diameter_px: f64, reference_distance_cm: f64, iris_diameter_cm: f64) -> f64 {
    median_diameter_px * reference_distance_cm / iris_diameter_cm
}

/// Solve the pinhole relation for real size at a known distance and focal length
#[must_use]
pub fn solve_iris_diameter_cm(median_diameter_px: f64, reference_distance_cm: f64, focal_length_px: f64) -> f64 {
    median_diameter_px * reference_distance_cm / focal_length_px
}

/// Measure both irises from one frame's landmarks, if a face is visible
///
/// # Errors
///
/// Propagates detector errors and ring extraction failures.
pub fn measure_frame(
    source: &mut dyn LandmarkSource,
    config: &Config,
) -> Result<Option<(IrisMeasurement, IrisMeasurement)>> {
    let Some(face) = source.next_landmarks()? else {
        return Ok(None);
    };

    let (width, height) = source.frame_size();
    let left_ring = iris_ring_points(&face, &config.geometry.left_iris_ring, width, height)?;
    let right_ring = iris_ring_points(&face, &config.geometry.right_iris_ring, width, height)?;

    Ok(Some((measure_iris(&left_ring), measure_iris(&right_ring))))
}

/// Run the shared sampling protocol for one calibration window
///
/// Samples at the configured cadence until the wall-clock duration elapses or
/// the accepted-sample cap is reached, whichever comes first. Frames without
/// a face and off-axis frames are skipped; they consume time but never abort
/// the run.
///
/// # Errors
///
/// Propagates detector errors and ring extraction failures.
pub fn collect_samples(source: &mut dyn LandmarkSource, config: &Config, duration: Duration) -> Result<Vec<f64>> {
    let calibration = &config.calibration;
    let interval = Duration::from_millis(calibration.sample_interval_ms);
    let deadline = Instant::now() + duration;
    let mut samples = Vec::with_capacity(calibration.sample_cap);

    while Instant::now() < deadline && samples.len() < calibration.sample_cap {
        match measure_frame(source, config)? {
            None => log::debug!("Calibration sample skipped: no face"),
            Some((left, right)) => {
                let ratio = gaze_ratio(left.diameter_px, right.diameter_px);
                if ratio > calibration.off_axis_ratio {
                    log::debug!("Calibration sample skipped: gaze ratio {ratio:.3}");
                } else {
                    samples.push(0.5 * (left.diameter_px + right.diameter_px));
                }
            }
        }

        // Cooperative pause so the host application is not starved between
        // samples
        if !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }

    log::info!("Calibration window closed with {} accepted samples", samples.len());
    Ok(samples)
}
