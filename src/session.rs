//! Session state and per-frame processing.
//!
//! All process-wide mutable state (calibration constants, the two robust
//! streams, the run mode) lives in one explicit `IpdSession` owned by the
//! caller. The session is single-threaded by contract: the live per-frame
//! path and a calibration procedure never run concurrently because both
//! borrow the session mutably for their full duration.

use crate::{
    calibration::{
        collect_samples, gaze_ratio, measure_frame, solve_focal_length_px, solve_iris_diameter_cm,
        CalibrationConstants, CalibrationKind,
    },
    config::Config,
    detector::LandmarkSource,
    error::{Error, Result},
    landmarks::PixelPoint,
    metrics::{estimate, DistanceMode, FrameMetrics, TrackingStatus, Warning},
    stream::{median, RobustStream},
};
use log::info;
use std::time::{Duration, Instant};

/// Session run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No processing since construction or the last calibration
    Idle,
    /// Per-frame live estimation
    Live,
    /// A calibration procedure owns sampling and stream mutation
    Calibrating(CalibrationKind),
}

/// Per-frame record handed to the presentation collaborator
///
/// Raw optional numerics only; formatting is the presenter's concern.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// Face visibility for this frame
    pub status: TrackingStatus,
    /// Processing rate over the last measurement window
    pub proc_fps: f64,
    /// Calibrated focal length in pixels, if any
    pub focal_length_px: Option<f64>,
    /// Personal iris diameter currently in use, in centimeters
    pub iris_diameter_cm: f64,
    /// Smoothed IPD in pixels, if any samples were accepted yet
    pub ipd_px: Option<f64>,
    /// Physical metrics for this frame
    pub metrics: FrameMetrics,
    /// How the distance value was obtained
    pub distance_mode: DistanceMode,
    /// Left and right iris centers for overlay drawing, when a face is visible
    pub iris_centers: Option<(PixelPoint, PixelPoint)>,
}

/// IPD estimation session
///
/// Owns both robust streams, the calibration constants and the mode machine.
/// Construct one per camera context; independent contexts must not share a
/// session.
pub struct IpdSession {
    config: Config,
    constants: CalibrationConstants,
    iris_stream: RobustStream,
    ipd_stream: RobustStream,
    mode: Mode,
    use_fixed_distance: bool,
    /// Bumped on every reset; a calibration only commits if the generation it
    /// started under is still current
    generation: u64,
    proc_fps: f64,
    frames_in_window: u32,
    fps_window_start: Instant,
}

impl IpdSession {
    /// Create a session with default calibration constants
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: Config) -> Result<Self> {
        let constants = CalibrationConstants {
            focal_length_px: None,
            iris_diameter_cm: config.calibration.default_iris_diameter_cm,
        };
        Self::with_constants(config, constants)
    }

    /// Create a session resuming previously persisted calibration constants
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn with_constants(config: Config, constants: CalibrationConstants) -> Result<Self> {
        config.validate()?;
        info!(
            "Session starting (focal: {:?} px, iris: {} cm)",
            constants.focal_length_px, constants.iris_diameter_cm
        );
        Ok(Self {
            iris_stream: RobustStream::new(config.streams.iris.window, config.streams.iris.k),
            ipd_stream: RobustStream::new(config.streams.ipd.window, config.streams.ipd.k),
            config,
            constants,
            mode: Mode::Idle,
            use_fixed_distance: false,
            generation: 0,
            proc_fps: 0.0,
            frames_in_window: 0,
            fps_window_start: Instant::now(),
        })
    }

    /// Current calibration constants
    #[must_use]
    pub fn constants(&self) -> &CalibrationConstants {
        &self.constants
    }

    /// Current run mode
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Pin reported distance to the configured reference distance
    pub fn set_fixed_distance(&mut self, enabled: bool) {
        self.use_fixed_distance = enabled;
    }

    /// Current smoothed iris diameter in pixels
    #[must_use]
    pub fn smoothed_iris_px(&self) -> Option<f64> {
        self.iris_stream.last()
    }

    /// Current smoothed IPD in pixels
    #[must_use]
    pub fn smoothed_ipd_px(&self) -> Option<f64> {
        self.ipd_stream.last()
    }

    /// Process one frame from the detector and build the presentation report
    ///
    /// "No face" frames leave both streams untouched and report last-known
    /// smoothed values with a degraded status. Gaze-asymmetric frames exclude
    /// the iris-diameter sample from smoothing but still feed the IPD stream:
    /// asymmetry distorts the projected iris outline, not the eye-center
    /// localization.
    ///
    /// # Errors
    ///
    /// Propagates detector errors and ring extraction failures.
    pub fn process_frame(&mut self, source: &mut dyn LandmarkSource) -> Result<FrameReport> {
        self.mode = Mode::Live;
        self.tick_fps();

        let Some((left, right)) = measure_frame(source, &self.config)? else {
            return Ok(self.build_report(TrackingStatus::NoFace, None, None));
        };

        let ratio = gaze_ratio(left.diameter_px, right.diameter_px);
        let warning = if ratio > self.config.calibration.off_axis_ratio {
            log::debug!("Off-axis frame (ratio {ratio:.3}), iris sample excluded");
            Some(Warning::OffAxisGaze)
        } else {
            None
        };

        let iris_sample = if warning.is_some() {
            None
        } else {
            Some(0.5 * (left.diameter_px + right.diameter_px))
        };
        self.iris_stream.add(iris_sample);
        self.ipd_stream.add(Some(left.center.distance(&right.center)));

        Ok(self.build_report(
            TrackingStatus::Tracking,
            warning,
            Some((left.center, right.center)),
        ))
    }

    /// Calibrate the focal length at the configured reference distance
    ///
    /// Runs the shared sampling protocol for the focal-length window, then
    /// solves `focal = median_px * distance / iris_cm`. On success the new
    /// focal length is stored. Both streams are cleared whether or not the
    /// procedure succeeds; their history predates the calibration window
    /// either way.
    ///
    /// # Errors
    ///
    /// Returns `CalibrationInsufficientSamples` if fewer than the configured
    /// minimum were accepted, `CalibrationSuperseded` if a reset happened
    /// after sampling began, or any detector error. Constants are unchanged
    /// on every failure path.
    pub fn calibrate_focal_length(&mut self, source: &mut dyn LandmarkSource) -> Result<f64> {
        info!(
            "Starting focal-length calibration at {} cm",
            self.config.calibration.reference_distance_cm
        );
        let generation = self.generation;
        self.mode = Mode::Calibrating(CalibrationKind::FocalLength);

        let duration = Duration::from_millis(self.config.calibration.focal_duration_ms);
        let result = collect_samples(source, &self.config, duration)
            .and_then(|samples| self.commit_focal_length(generation, &samples));

        // Leaving Calibrating always clears the streams: live history from
        // before the procedure is stale regardless of the outcome
        self.clear_streams();
        self.mode = Mode::Idle;
        result
    }

    /// Calibrate the personal iris diameter at the configured reference distance
    ///
    /// Requires a prior focal-length calibration; fails immediately without
    /// sampling (and without touching the streams) otherwise. On success the
    /// new iris diameter is stored; the streams are cleared as for the focal
    /// procedure.
    ///
    /// # Errors
    ///
    /// Returns `CalibrationPrecondition` when no focal length is set,
    /// `CalibrationInsufficientSamples` or `CalibrationSuperseded` as for the
    /// focal procedure, or any detector error.
    pub fn calibrate_iris_diameter(&mut self, source: &mut dyn LandmarkSource) -> Result<f64> {
        if self.constants.focal_length_px.is_none() {
            return Err(Error::CalibrationPrecondition(
                "focal length must be calibrated before iris size".to_string(),
            ));
        }

        info!(
            "Starting iris-size calibration at {} cm",
            self.config.calibration.reference_distance_cm
        );
        let generation = self.generation;
        self.mode = Mode::Calibrating(CalibrationKind::IrisDiameter);

        let duration = Duration::from_millis(self.config.calibration.iris_duration_ms);
        let result = collect_samples(source, &self.config, duration)
            .and_then(|samples| self.commit_iris_diameter(generation, &samples));

        self.clear_streams();
        self.mode = Mode::Idle;
        result
    }

    /// Discard all calibration state and smoothing history
    pub fn reset(&mut self) {
        info!("Session reset");
        self.generation += 1;
        self.constants.reset(self.config.calibration.default_iris_diameter_cm);
        self.clear_streams();
        self.mode = Mode::Idle;
    }

    fn commit_focal_length(&mut self, generation: u64, samples: &[f64]) -> Result<f64> {
        let median_px = self.accepted_median(samples)?;
        self.check_generation(generation)?;

        let focal = solve_focal_length_px(
            median_px,
            self.config.calibration.reference_distance_cm,
            self.constants.iris_diameter_cm,
        );
        self.constants.focal_length_px = Some(focal);
        self.clear_streams();
        info!("Focal length calibrated: {focal:.1} px");
        Ok(focal)
    }

    fn commit_iris_diameter(&mut self, generation: u64, samples: &[f64]) -> Result<f64> {
        let median_px = self.accepted_median(samples)?;
        self.check_generation(generation)?;

        // Precondition was checked before sampling; a reset in between is
        // caught by the generation check above
        let focal = self
            .constants
            .focal_length_px
            .ok_or_else(|| Error::CalibrationPrecondition("focal length unset".to_string()))?;

        let iris_cm = solve_iris_diameter_cm(median_px, self.config.calibration.reference_distance_cm, focal);
        self.constants.iris_diameter_cm = iris_cm;
        self.clear_streams();
        info!("Iris diameter calibrated: {iris_cm:.3} cm");
        Ok(iris_cm)
    }

    fn accepted_median(&self, samples: &[f64]) -> Result<f64> {
        let required = self.config.calibration.min_samples;
        if samples.len() < required {
            return Err(Error::CalibrationInsufficientSamples {
                accepted: samples.len(),
                required,
            });
        }
        median(samples).ok_or_else(|| Error::InvalidInput("Empty calibration sample set".to_string()))
    }

    fn check_generation(&self, generation: u64) -> Result<()> {
        if self.generation == generation {
            Ok(())
        } else {
            Err(Error::CalibrationSuperseded)
        }
    }

    fn clear_streams(&mut self) {
        self.iris_stream.clear();
        self.ipd_stream.clear();
    }

    fn build_report(
        &self,
        status: TrackingStatus,
        warning: Option<Warning>,
        iris_centers: Option<(PixelPoint, PixelPoint)>,
    ) -> FrameReport {
        let metrics = estimate(
            self.iris_stream.last(),
            self.ipd_stream.last(),
            &self.constants,
            self.use_fixed_distance,
            self.config.calibration.reference_distance_cm,
            warning,
        );
        let distance_mode = if self.use_fixed_distance {
            DistanceMode::Fixed
        } else {
            DistanceMode::Estimated
        };

        FrameReport {
            status,
            proc_fps: self.proc_fps,
            focal_length_px: self.constants.focal_length_px,
            iris_diameter_cm: self.constants.iris_diameter_cm,
            ipd_px: self.ipd_stream.last(),
            metrics,
            distance_mode,
            iris_centers,
        }
    }

    fn tick_fps(&mut self) {
        self.frames_in_window += 1;
        let elapsed = self.fps_window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.proc_fps = f64::from(self.frames_in_window) / elapsed.as_secs_f64();
            self.frames_in_window = 0;
            self.fps_window_start = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> Config {
        let mut config = Config::default();
        config.calibration.sample_interval_ms = 0;
        config.calibration.focal_duration_ms = 200;
        config.calibration.iris_duration_ms = 200;
        config
    }

    #[test]
    fn test_reset_supersedes_inflight_calibration() {
        let mut session = IpdSession::new(quick_config()).unwrap();
        let generation = session.generation;
        let samples = vec![40.0; 10];

        session.reset();

        // A commit from a run that began before the reset must be discarded
        let result = session.commit_focal_length(generation, &samples);
        assert!(matches!(result, Err(Error::CalibrationSuperseded)));
        assert_eq!(session.constants().focal_length_px, None);
    }

    #[test]
    fn test_commit_requires_minimum_samples() {
        let mut session = IpdSession::new(quick_config()).unwrap();
        let generation = session.generation;

        let result = session.commit_focal_length(generation, &[40.0; 9]);
        assert!(matches!(
            result,
            Err(Error::CalibrationInsufficientSamples { accepted: 9, required: 10 })
        ));
        assert_eq!(session.constants().focal_length_px, None);
    }

    #[test]
    fn test_commit_clears_streams() {
        let mut session = IpdSession::new(quick_config()).unwrap();
        session.iris_stream.add(Some(40.0));
        session.ipd_stream.add(Some(180.0));

        let generation = session.generation;
        session.commit_focal_length(generation, &[40.0; 10]).unwrap();

        assert_eq!(session.smoothed_iris_px(), None);
        assert_eq!(session.smoothed_ipd_px(), None);
        // focal = 40 * 30 / 1.17
        let focal = session.constants().focal_length_px.unwrap();
        assert!((focal - 40.0 * 30.0 / 1.17).abs() < 1e-9);
    }

    #[test]
    fn test_iris_calibration_requires_focal() {
        let mut session = IpdSession::new(quick_config()).unwrap();

        struct NeverCalled;
        impl LandmarkSource for NeverCalled {
            fn next_landmarks(&mut self) -> Result<Option<crate::landmarks::FaceLandmarks>> {
                panic!("precondition failure must not sample");
            }
            fn frame_size(&self) -> (f64, f64) {
                (640.0, 480.0)
            }
        }

        let result = session.calibrate_iris_diameter(&mut NeverCalled);
        assert!(matches!(result, Err(Error::CalibrationPrecondition(_))));
    }
}
