//! Constants used throughout the application

/// Number of landmarks in the refined face mesh (468 contour points + 10 iris points)
pub const REFINED_LANDMARK_COUNT: usize = 478;

/// Iris ring landmark indices, left eye (refined face mesh)
pub const LEFT_IRIS_RING: [usize; 4] = [469, 470, 471, 472];

/// Iris ring landmark indices, right eye (refined face mesh)
pub const RIGHT_IRIS_RING: [usize; 4] = [474, 475, 476, 477];

/// Default robust stream window size
pub const DEFAULT_STREAM_WINDOW: usize = 21;

/// Default robust stream outlier gate factor
pub const DEFAULT_STREAM_K: f64 = 3.5;

/// Samples required before the outlier gate activates
pub const MIN_BASELINE_SAMPLES: usize = 5;

/// MAD consistency factor for Gaussian noise
pub const MAD_SCALE: f64 = 1.4826;

/// Floor applied to MAD so a perfectly stable signal cannot lock out new samples
pub const MAD_FLOOR: f64 = 1.0;

/// Default personal iris diameter in centimeters
pub const DEFAULT_IRIS_DIAMETER_CM: f64 = 1.17;

/// Default reference distance for calibration and fixed-distance mode
pub const DEFAULT_REFERENCE_DISTANCE_CM: f64 = 30.0;

/// Default left/right iris diameter ratio above which a sample counts as off-axis
pub const DEFAULT_OFF_AXIS_RATIO: f64 = 1.15;

/// Default minimum accepted samples for a calibration to succeed
pub const DEFAULT_MIN_CALIBRATION_SAMPLES: usize = 10;

/// Default accepted-sample cap that ends a calibration run early
pub const DEFAULT_CALIBRATION_SAMPLE_CAP: usize = 20;

/// Default pause between calibration samples in milliseconds
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 30;

/// Default focal-length calibration window in milliseconds
pub const DEFAULT_FOCAL_CALIBRATION_MS: u64 = 3000;

/// Default iris-size calibration window in milliseconds
pub const DEFAULT_IRIS_CALIBRATION_MS: u64 = 2000;

/// Containment tolerance for circle feasibility checks, in pixels
pub const CONTAINMENT_TOLERANCE: f64 = 1e-3;

/// Orientation determinant magnitude below which a point triple is near-colinear
pub const COLINEARITY_EPSILON: f64 = 1e-6;

/// Floor applied to the smaller iris diameter in the gaze-symmetry ratio
pub const MIN_DIAMETER_PX: f64 = 1e-6;
