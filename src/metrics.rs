//! Per-frame metric estimation from smoothed pixel measurements.

use crate::calibration::CalibrationConstants;

/// How the frame's distance value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMode {
    /// Distance pinned to the configured reference distance
    Fixed,
    /// Distance inverted from the pinhole model
    Estimated,
}

/// Per-frame quality warning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// Gaze asymmetry invalidated this frame's iris-diameter sample
    OffAxisGaze,
}

/// Face visibility status for the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    /// A face was detected and measured
    Tracking,
    /// No face this frame; values are last-known
    NoFace,
}

/// Physical metrics derived for one frame
///
/// A `None` field means the value is genuinely unavailable this frame; it is
/// never conflated with zero or a numeric sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetrics {
    /// Camera-to-face distance in centimeters
    pub distance_cm: Option<f64>,
    /// Interpupillary distance in centimeters
    pub ipd_cm: Option<f64>,
    /// Quality warning for this frame
    pub warning: Option<Warning>,
}

/// Combine smoothed measurements and calibration constants into physical metrics
///
/// Pure: same inputs always give the same metrics. Distance comes from the
/// pinhole inversion `focal * iris_cm / iris_px` unless fixed-distance mode
/// pins it to the reference distance; IPD then scales the smoothed pixel IPD
/// by `distance / focal`. Any missing operand makes the dependent value
/// unavailable.
#[must_use]
pub fn estimate(
    smoothed_iris_px: Option<f64>,
    smoothed_ipd_px: Option<f64>,
    constants: &CalibrationConstants,
    use_fixed_distance: bool,
    fixed_distance_cm: f64,
    warning: Option<Warning>,
) -> FrameMetrics {
    let distance_cm = if use_fixed_distance {
        Some(fixed_distance_cm)
    } else {
        match (constants.focal_length_px, smoothed_iris_px) {
            (Some(focal), Some(iris_px)) if iris_px != 0.0 => {
                Some(focal * constants.iris_diameter_cm / iris_px)
            }
            _ => None,
        }
    };

    let ipd_cm = match (smoothed_ipd_px, distance_cm, constants.focal_length_px) {
        (Some(ipd_px), Some(distance), Some(focal)) => Some(ipd_px * distance / focal),
        _ => None,
    };

    FrameMetrics {
        distance_cm,
        ipd_cm,
        warning,
    }
}
