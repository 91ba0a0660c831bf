//! Error types for the IPD estimation library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Landmark set too small for the configured iris rings
    #[error("Landmark error: {0}")]
    LandmarkError(String),

    /// Replay file loading or parsing error
    #[error("Replay error: {0}")]
    ReplayError(String),

    /// Calibration collected fewer accepted samples than required
    #[error("Calibration failed: {accepted} accepted samples, {required} required")]
    CalibrationInsufficientSamples {
        /// Samples that passed the gaze-symmetry gate
        accepted: usize,
        /// Minimum required for a trustworthy median
        required: usize,
    },

    /// Calibration attempted before its precondition was satisfied
    #[error("Calibration precondition unmet: {0}")]
    CalibrationPrecondition(String),

    /// A reset invalidated the session state while a calibration was sampling
    #[error("Calibration superseded by a concurrent reset")]
    CalibrationSuperseded,

    /// Calibration store read or write error
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
