//! Configuration management for the IPD estimation pipeline

use crate::{
    constants::{
        DEFAULT_CALIBRATION_SAMPLE_CAP, DEFAULT_FOCAL_CALIBRATION_MS, DEFAULT_IRIS_CALIBRATION_MS,
        DEFAULT_IRIS_DIAMETER_CM, DEFAULT_MIN_CALIBRATION_SAMPLES, DEFAULT_OFF_AXIS_RATIO,
        DEFAULT_REFERENCE_DISTANCE_CM, DEFAULT_SAMPLE_INTERVAL_MS, DEFAULT_STREAM_K, DEFAULT_STREAM_WINDOW,
        LEFT_IRIS_RING, RIGHT_IRIS_RING,
    },
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Robust stream configuration
    pub streams: StreamsConfig,

    /// Calibration configuration
    pub calibration: CalibrationConfig,

    /// Landmark geometry configuration
    pub geometry: GeometryConfig,
}

/// Per-stream smoothing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamParams {
    /// Bounded window size
    pub window: usize,

    /// Outlier gate factor (multiples of the MAD-based scale)
    pub k: f64,
}

/// Smoothing parameters for both measurement streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamsConfig {
    /// Iris diameter stream
    pub iris: StreamParams,

    /// IPD-in-pixels stream
    pub ipd: StreamParams,
}

/// Calibration procedure parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Reference distance the subject holds during calibration, in cm.
    /// Also the distance reported in fixed-distance mode.
    pub reference_distance_cm: f64,

    /// Personal iris diameter before any iris calibration, in cm
    pub default_iris_diameter_cm: f64,

    /// Left/right diameter ratio above which a sample counts as off-axis
    pub off_axis_ratio: f64,

    /// Minimum accepted samples for a calibration to succeed
    pub min_samples: usize,

    /// Accepted-sample cap that ends a run early
    pub sample_cap: usize,

    /// Pause between samples in milliseconds
    pub sample_interval_ms: u64,

    /// Focal-length calibration window in milliseconds
    pub focal_duration_ms: u64,

    /// Iris-size calibration window in milliseconds
    pub iris_duration_ms: u64,
}

/// Landmark index tables for the iris rings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Left iris ring landmark indices
    pub left_iris_ring: [usize; 4],

    /// Right iris ring landmark indices
    pub right_iris_ring: [usize; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            streams: StreamsConfig::default(),
            calibration: CalibrationConfig::default(),
            geometry: GeometryConfig::default(),
        }
    }
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_STREAM_WINDOW,
            k: DEFAULT_STREAM_K,
        }
    }
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            iris: StreamParams::default(),
            ipd: StreamParams::default(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            reference_distance_cm: DEFAULT_REFERENCE_DISTANCE_CM,
            default_iris_diameter_cm: DEFAULT_IRIS_DIAMETER_CM,
            off_axis_ratio: DEFAULT_OFF_AXIS_RATIO,
            min_samples: DEFAULT_MIN_CALIBRATION_SAMPLES,
            sample_cap: DEFAULT_CALIBRATION_SAMPLE_CAP,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            focal_duration_ms: DEFAULT_FOCAL_CALIBRATION_MS,
            iris_duration_ms: DEFAULT_IRIS_CALIBRATION_MS,
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            left_iris_ring: LEFT_IRIS_RING,
            right_iris_ring: RIGHT_IRIS_RING,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, params) in [("iris", &self.streams.iris), ("ipd", &self.streams.ipd)] {
            if params.window == 0 {
                return Err(Error::ConfigError(format!(
                    "{name} stream window must be greater than 0"
                )));
            }
            if params.k <= 0.0 {
                return Err(Error::ConfigError(format!(
                    "{name} stream gate factor must be positive"
                )));
            }
        }

        if self.calibration.reference_distance_cm <= 0.0 {
            return Err(Error::ConfigError(
                "Reference distance must be positive".to_string(),
            ));
        }
        if self.calibration.default_iris_diameter_cm <= 0.0 {
            return Err(Error::ConfigError(
                "Default iris diameter must be positive".to_string(),
            ));
        }
        if self.calibration.off_axis_ratio < 1.0 {
            return Err(Error::ConfigError(
                "Off-axis ratio threshold must be at least 1.0".to_string(),
            ));
        }
        if self.calibration.min_samples == 0 {
            return Err(Error::ConfigError(
                "Minimum calibration samples must be greater than 0".to_string(),
            ));
        }
        if self.calibration.sample_cap < self.calibration.min_samples {
            return Err(Error::ConfigError(
                "Sample cap must be at least the minimum sample count".to_string(),
            ));
        }
        if self.calibration.focal_duration_ms == 0 || self.calibration.iris_duration_ms == 0 {
            return Err(Error::ConfigError(
                "Calibration durations must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# IPD Estimation Configuration

# Robust stream smoothing
streams:
  iris:
    window: 21
    k: 3.5
  ipd:
    window: 21
    k: 3.5

# Calibration procedures
calibration:
  reference_distance_cm: 30.0
  default_iris_diameter_cm: 1.17
  off_axis_ratio: 1.15
  min_samples: 10
  sample_cap: 20
  sample_interval_ms: 30
  focal_duration_ms: 3000
  iris_duration_ms: 2000

# Iris ring landmark indices (refined face mesh)
geometry:
  left_iris_ring: [469, 470, 471, 472]
  right_iris_ring: [474, 475, 476, 477]
"#;
