//! Calibration procedure tests with scripted landmark sources

use ipd_estimation::config::Config;
use ipd_estimation::constants::{LEFT_IRIS_RING, RIGHT_IRIS_RING, REFINED_LANDMARK_COUNT};
use ipd_estimation::detector::LandmarkSource;
use ipd_estimation::landmarks::{FaceLandmarks, LandmarkPoint};
use ipd_estimation::session::IpdSession;
use ipd_estimation::{Error, Result};

const FRAME_W: f64 = 640.0;
const FRAME_H: f64 = 480.0;

/// Landmark source replaying a fixed frame script, then "no face" forever
struct ScriptedSource {
    frames: Vec<Option<FaceLandmarks>>,
    position: usize,
}

impl ScriptedSource {
    fn new(frames: Vec<Option<FaceLandmarks>>) -> Self {
        Self { frames, position: 0 }
    }
}

impl LandmarkSource for ScriptedSource {
    fn next_landmarks(&mut self) -> Result<Option<FaceLandmarks>> {
        let frame = self.frames.get(self.position).cloned().flatten();
        self.position += 1;
        Ok(frame)
    }

    fn frame_size(&self) -> (f64, f64) {
        (FRAME_W, FRAME_H)
    }
}

/// Place a diamond-shaped iris ring of the given pixel diameter
fn set_ring(points: &mut [LandmarkPoint], ring: &[usize; 4], center: (f64, f64), diameter_px: f64) {
    let r = diameter_px / 2.0;
    let offsets = [(r, 0.0), (0.0, -r), (-r, 0.0), (0.0, r)];
    for (&index, &(dx, dy)) in ring.iter().zip(offsets.iter()) {
        points[index] = LandmarkPoint {
            x: (center.0 + dx) / FRAME_W,
            y: (center.1 + dy) / FRAME_H,
        };
    }
}

/// Build a full landmark set with both irises at the given pixel diameters
fn face(left_diameter_px: f64, right_diameter_px: f64) -> FaceLandmarks {
    let mut points = vec![LandmarkPoint { x: 0.0, y: 0.0 }; REFINED_LANDMARK_COUNT];
    set_ring(&mut points, &LEFT_IRIS_RING, (220.0, 240.0), left_diameter_px);
    set_ring(&mut points, &RIGHT_IRIS_RING, (420.0, 240.0), right_diameter_px);
    FaceLandmarks::new(points)
}

/// Config with test-friendly timing: no pause, short windows
fn quick_config() -> Config {
    let mut config = Config::default();
    config.calibration.sample_interval_ms = 1;
    config.calibration.focal_duration_ms = 500;
    config.calibration.iris_duration_ms = 500;
    config
}

#[test]
fn test_focal_calibration_success() {
    let mut session = IpdSession::new(quick_config()).unwrap();
    let mut source = ScriptedSource::new(vec![Some(face(40.0, 40.0)); 25]);

    let focal = session.calibrate_focal_length(&mut source).unwrap();

    // focal = median(40) * 30 / 1.17
    let expected = 40.0 * 30.0 / 1.17;
    assert!((focal - expected).abs() < 1e-6, "focal {focal}, expected {expected}");
    assert_eq!(session.constants().focal_length_px, Some(focal));
}

#[test]
fn test_focal_calibration_stops_at_sample_cap() {
    let mut config = quick_config();
    // Long window: only the cap can end the run early
    config.calibration.focal_duration_ms = 60_000;
    let mut session = IpdSession::new(config).unwrap();

    let mut source = ScriptedSource::new(vec![Some(face(40.0, 40.0)); 50]);
    let start = std::time::Instant::now();
    session.calibrate_focal_length(&mut source).unwrap();

    // 20 accepted samples at 1 ms cadence finish in well under a second
    assert!(start.elapsed() < std::time::Duration::from_secs(5));
}

#[test]
fn test_calibration_fails_over_no_face_window() {
    let mut session = IpdSession::new(quick_config()).unwrap();
    let mut source = ScriptedSource::new(vec![None; 10]);

    let result = session.calibrate_focal_length(&mut source);

    assert!(matches!(
        result,
        Err(Error::CalibrationInsufficientSamples { accepted: 0, .. })
    ));
    // Constants stay whatever they were before the attempt
    assert_eq!(session.constants().focal_length_px, None);
}

#[test]
fn test_off_axis_samples_excluded_from_calibration() {
    let mut session = IpdSession::new(quick_config()).unwrap();

    // Ld=10, Rd=13 gives ratio 1.3 > 1.15: discarded. Only 8 symmetric
    // frames are offered, so the run falls short of the 10-sample minimum.
    let mut frames = vec![Some(face(10.0, 13.0)); 30];
    frames.extend(vec![Some(face(40.0, 40.0)); 8]);
    let mut source = ScriptedSource::new(frames);

    let result = session.calibrate_focal_length(&mut source);
    assert!(matches!(
        result,
        Err(Error::CalibrationInsufficientSamples { accepted: 8, .. })
    ));
}

#[test]
fn test_off_axis_frames_do_not_bias_accepted_median() {
    let mut session = IpdSession::new(quick_config()).unwrap();

    // Asymmetric frames interleaved with good ones; the median must come
    // from the symmetric frames alone
    let mut frames = Vec::new();
    for _ in 0..15 {
        frames.push(Some(face(80.0, 100.0)));
        frames.push(Some(face(40.0, 40.0)));
    }
    let mut source = ScriptedSource::new(frames);

    let focal = session.calibrate_focal_length(&mut source).unwrap();
    let expected = 40.0 * 30.0 / 1.17;
    assert!((focal - expected).abs() < 1e-6);
}

#[test]
fn test_iris_calibration_requires_focal_first() {
    let mut session = IpdSession::new(quick_config()).unwrap();
    let mut source = ScriptedSource::new(vec![Some(face(40.0, 40.0)); 25]);

    let result = session.calibrate_iris_diameter(&mut source);

    assert!(matches!(result, Err(Error::CalibrationPrecondition(_))));
    // Precondition failures never consume frames
    assert_eq!(source.position, 0);
}

#[test]
fn test_iris_calibration_personalizes_diameter() {
    let mut session = IpdSession::new(quick_config()).unwrap();

    let mut source = ScriptedSource::new(vec![Some(face(40.0, 40.0)); 25]);
    let focal = session.calibrate_focal_length(&mut source).unwrap();

    // Same subject now measures 42 px at the reference distance
    let mut source = ScriptedSource::new(vec![Some(face(42.0, 42.0)); 25]);
    let iris_cm = session.calibrate_iris_diameter(&mut source).unwrap();

    let expected = 42.0 * 30.0 / focal;
    assert!((iris_cm - expected).abs() < 1e-9);
    assert!((session.constants().iris_diameter_cm - expected).abs() < 1e-9);
}

#[test]
fn test_successful_calibration_clears_smoothing_history() {
    let mut session = IpdSession::new(quick_config()).unwrap();

    // Build up live smoothing history first
    let mut live = ScriptedSource::new(vec![Some(face(40.0, 40.0)); 8]);
    for _ in 0..8 {
        session.process_frame(&mut live).unwrap();
    }
    assert!(session.smoothed_iris_px().is_some());
    assert!(session.smoothed_ipd_px().is_some());

    let mut source = ScriptedSource::new(vec![Some(face(40.0, 40.0)); 25]);
    session.calibrate_focal_length(&mut source).unwrap();

    // Pre-calibration history must never mix with post-calibration values
    assert_eq!(session.smoothed_iris_px(), None);
    assert_eq!(session.smoothed_ipd_px(), None);
}

#[test]
fn test_failed_calibration_also_clears_streams() {
    let mut session = IpdSession::new(quick_config()).unwrap();

    let mut live = ScriptedSource::new(vec![Some(face(40.0, 40.0)); 4]);
    for _ in 0..4 {
        session.process_frame(&mut live).unwrap();
    }
    assert!(session.smoothed_iris_px().is_some());

    let mut source = ScriptedSource::new(vec![None; 5]);
    assert!(session.calibrate_focal_length(&mut source).is_err());

    // The pre-calibration live history is stale after the sampling window
    assert_eq!(session.smoothed_iris_px(), None);
    assert_eq!(session.smoothed_ipd_px(), None);
    // Constants are untouched by the failed run
    assert_eq!(session.constants().focal_length_px, None);
}

#[test]
fn test_reset_restores_defaults() {
    let mut session = IpdSession::new(quick_config()).unwrap();

    let mut source = ScriptedSource::new(vec![Some(face(40.0, 40.0)); 25]);
    session.calibrate_focal_length(&mut source).unwrap();
    assert!(session.constants().focal_length_px.is_some());

    session.reset();

    assert_eq!(session.constants().focal_length_px, None);
    assert!((session.constants().iris_diameter_cm - 1.17).abs() < 1e-12);
    assert_eq!(session.smoothed_iris_px(), None);
}

#[test]
fn test_pinhole_round_trip_through_live_estimation() {
    let mut session = IpdSession::new(quick_config()).unwrap();

    // Calibrate at 40 px apparent diameter, then keep measuring 40 px:
    // the estimated distance must recover the 30 cm reference
    let mut source = ScriptedSource::new(vec![Some(face(40.0, 40.0)); 25]);
    session.calibrate_focal_length(&mut source).unwrap();

    let mut live = ScriptedSource::new(vec![Some(face(40.0, 40.0)); 10]);
    let mut report = None;
    for _ in 0..10 {
        report = Some(session.process_frame(&mut live).unwrap());
    }

    let distance = report.unwrap().metrics.distance_cm.unwrap();
    assert!((distance - 30.0).abs() < 1e-6, "distance {distance}");
}
