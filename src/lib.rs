//! Interpupillary-distance estimation from monocular facial landmarks.
//!
//! This library turns noisy per-frame 2D eye landmarks into a stable physical
//! measurement using:
//! - A minimal enclosing circle fit over each eye's 4-point iris ring
//! - Robust temporal smoothing (bounded-window running median with a
//!   median/MAD outlier gate)
//! - A two-stage pinhole-camera calibration for focal length and personal
//!   iris size, inverted every frame for distance and IPD in centimeters
//!
//! The face-landmark detector is an external collaborator: anything that
//! implements [`detector::LandmarkSource`] can drive the pipeline.
//!
//! # Examples
//!
//! ## Robust smoothing
//!
//! ```
//! use ipd_estimation::stream::RobustStream;
//!
//! let mut stream = RobustStream::new(21, 3.5);
//! for _ in 0..5 {
//!     stream.add(Some(34.0));
//! }
//!
//! // A single-frame spike is rejected, the median holds
//! assert_eq!(stream.add(Some(500.0)), Some(34.0));
//!
//! // A missing frame leaves the stream untouched
//! assert_eq!(stream.add(None), Some(34.0));
//! ```
//!
//! ## Iris measurement
//!
//! ```
//! use ipd_estimation::circle_fit::measure_iris;
//! use ipd_estimation::landmarks::PixelPoint;
//!
//! let ring = [
//!     PixelPoint::new(324.0, 240.0),
//!     PixelPoint::new(320.0, 236.0),
//!     PixelPoint::new(316.0, 240.0),
//!     PixelPoint::new(320.0, 244.0),
//! ];
//!
//! let iris = measure_iris(&ring);
//! assert!((iris.diameter_px - 8.0).abs() < 1e-9);
//! ```
//!
//! ## Live pipeline
//!
//! ```no_run
//! use ipd_estimation::config::Config;
//! use ipd_estimation::detector::ReplaySource;
//! use ipd_estimation::session::IpdSession;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = ReplaySource::from_file("session.json")?;
//! let mut session = IpdSession::new(Config::default())?;
//!
//! // Calibrate with the subject at the reference distance
//! let focal = session.calibrate_focal_length(&mut source)?;
//! println!("Focal length: {focal:.1} px");
//!
//! // Then estimate per frame
//! while !source.is_exhausted() {
//!     let report = session.process_frame(&mut source)?;
//!     if let Some(ipd_cm) = report.metrics.ipd_cm {
//!         println!("IPD: {ipd_cm:.2} cm");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// Landmark types and pixel-space geometry extraction
pub mod landmarks;

/// Minimal enclosing circle fit for 4-point iris rings
pub mod circle_fit;

/// Robust temporal smoothing for scalar measurement streams
pub mod stream;

/// Detector collaborator interface and replay source
pub mod detector;

/// Calibration engine for focal length and personal iris size
pub mod calibration;

/// Per-frame metric estimation
pub mod metrics;

/// Session state and per-frame processing
pub mod session;

/// Persistence collaborator for calibration constants
pub mod persistence;

/// Error types and result handling
pub mod error;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
