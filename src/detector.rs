//! Detector collaborator interface and the file-backed replay source.
//!
//! The face-landmark detector itself is external: the core only requires
//! something that yields one face's normalized landmark set per invocation,
//! or `None` when no face is visible. `ReplaySource` implements the contract
//! over a recorded landmark file so the full pipeline can run offline.

use crate::{
    landmarks::{FaceLandmarks, LandmarkPoint},
    Error, Result,
};
use serde::Deserialize;
use std::path::Path;

/// Source of per-frame landmark sets
///
/// `Ok(None)` means "no face this frame" and must be tolerated every frame:
/// the core degrades to last-known values instead of failing.
pub trait LandmarkSource {
    /// Produce the next frame's landmark set, or `None` when no face is visible
    fn next_landmarks(&mut self) -> Result<Option<FaceLandmarks>>;

    /// Frame dimensions in pixels as `(width, height)`
    fn frame_size(&self) -> (f64, f64);
}

/// Recorded landmark file format
#[derive(Debug, Deserialize)]
struct ReplayFile {
    width: f64,
    height: f64,
    frames: Vec<Option<Vec<[f64; 2]>>>,
}

/// Landmark source replaying a recorded session from a JSON file
///
/// The file holds frame dimensions and an array of frames; each frame is
/// either `null` (no face) or an array of `[x, y]` normalized landmark pairs.
pub struct ReplaySource {
    width: f64,
    height: f64,
    frames: Vec<Option<FaceLandmarks>>,
    position: usize,
}

impl ReplaySource {
    /// Load a recorded landmark session
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, fails to parse, or
    /// declares non-positive frame dimensions.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        log::info!("Loading landmark replay: {}", path.as_ref().display());
        let content = std::fs::read_to_string(path)?;
        let parsed: ReplayFile = serde_json::from_str(&content)
            .map_err(|e| Error::ReplayError(format!("Failed to parse replay file: {e}")))?;

        if parsed.width <= 0.0 || parsed.height <= 0.0 {
            return Err(Error::ReplayError(format!(
                "Frame dimensions must be positive, got {}x{}",
                parsed.width, parsed.height
            )));
        }

        let frames = parsed
            .frames
            .into_iter()
            .map(|frame| {
                frame.map(|points| {
                    FaceLandmarks::new(
                        points
                            .into_iter()
                            .map(|[x, y]| LandmarkPoint { x, y })
                            .collect(),
                    )
                })
            })
            .collect::<Vec<_>>();

        log::info!("Replay holds {} frames", frames.len());
        Ok(Self {
            width: parsed.width,
            height: parsed.height,
            frames,
            position: 0,
        })
    }

    /// Total number of recorded frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the replay holds no frames
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether every recorded frame has been consumed
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.frames.len()
    }
}

impl LandmarkSource for ReplaySource {
    fn next_landmarks(&mut self) -> Result<Option<FaceLandmarks>> {
        // Past the recording there is nothing to see; report "no face" so
        // calibration windows that outlive the recording fail cleanly instead
        // of erroring out.
        let Some(frame) = self.frames.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        Ok(frame.clone())
    }

    fn frame_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}
