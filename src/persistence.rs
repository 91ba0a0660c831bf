//! Persistence collaborator for calibration constants.
//!
//! Only two scalars survive a session: the focal length (if calibrated) and
//! the personal iris diameter. The application layer loads them at startup
//! and writes them back after a successful calibration or an explicit reset.

use crate::{calibration::CalibrationConstants, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Calibration constants in their persisted form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredCalibration {
    /// Focal length in pixels, absent until calibrated
    pub focal_length_px: Option<f64>,
    /// Personal iris diameter in centimeters
    pub iris_diameter_cm: f64,
}

impl From<&CalibrationConstants> for StoredCalibration {
    fn from(constants: &CalibrationConstants) -> Self {
        Self {
            focal_length_px: constants.focal_length_px,
            iris_diameter_cm: constants.iris_diameter_cm,
        }
    }
}

impl From<StoredCalibration> for CalibrationConstants {
    fn from(stored: StoredCalibration) -> Self {
        Self {
            focal_length_px: stored.focal_length_px,
            iris_diameter_cm: stored.iris_diameter_cm,
        }
    }
}

/// Store for calibration constants across sessions
pub trait CalibrationStore {
    /// Load persisted constants, or `None` when nothing was stored yet
    fn load(&self) -> Result<Option<StoredCalibration>>;

    /// Persist the given constants
    fn save(&self, calibration: &StoredCalibration) -> Result<()>;
}

/// File-backed calibration store in YAML format
pub struct YamlCalibrationStore {
    path: PathBuf,
}

impl YamlCalibrationStore {
    /// Create a store over the given file path
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CalibrationStore for YamlCalibrationStore {
    fn load(&self) -> Result<Option<StoredCalibration>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let stored = serde_yaml::from_str(&content)
            .map_err(|e| Error::Persistence(format!("Failed to parse calibration store: {e}")))?;
        Ok(Some(stored))
    }

    fn save(&self, calibration: &StoredCalibration) -> Result<()> {
        let content = serde_yaml::to_string(calibration)
            .map_err(|e| Error::Persistence(format!("Failed to serialize calibration: {e}")))?;
        std::fs::write(&self.path, content)?;
        log::info!("Calibration saved to {}", self.path.display());
        Ok(())
    }
}
