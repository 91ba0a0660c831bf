//! Landmark types and pixel-space geometry extraction.
//!
//! The detector reports normalized coordinates in [0,1]×[0,1]; everything
//! downstream works in pixel space, so the extraction step scales each
//! landmark by the frame dimensions.

use crate::{constants::REFINED_LANDMARK_COUNT, Error, Result};

/// A single detector landmark, normalized to the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkPoint {
    /// Normalized horizontal coordinate in [0, 1]
    pub x: f64,
    /// Normalized vertical coordinate in [0, 1]
    pub y: f64,
}

/// A point in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    /// Horizontal pixel coordinate
    pub x: f64,
    /// Vertical pixel coordinate
    pub y: f64,
}

impl PixelPoint {
    /// Create a new pixel point
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance(&self, other: &PixelPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One face's landmark set for a single frame
#[derive(Debug, Clone)]
pub struct FaceLandmarks {
    points: Vec<LandmarkPoint>,
}

impl FaceLandmarks {
    /// Wrap a detector landmark set
    #[must_use]
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    /// Number of landmarks in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmark at the given index, if present
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index)
    }
}

/// Extract one eye's iris ring as pixel points
///
/// Scales each ring landmark by the frame dimensions. The detector contract
/// guarantees the ring indices are valid for its model; a short landmark set
/// is rejected rather than silently producing garbage geometry.
///
/// # Errors
///
/// Returns an error if any ring index is outside the landmark set.
pub fn iris_ring_points(
    face: &FaceLandmarks,
    ring: &[usize; 4],
    frame_width: f64,
    frame_height: f64,
) -> Result<[PixelPoint; 4]> {
    let mut points = [PixelPoint::new(0.0, 0.0); 4];
    for (slot, &index) in points.iter_mut().zip(ring.iter()) {
        let landmark = face.get(index).ok_or_else(|| {
            Error::LandmarkError(format!(
                "Ring index {} out of range for {} landmarks (expected {})",
                index,
                face.len(),
                REFINED_LANDMARK_COUNT
            ))
        })?;
        *slot = PixelPoint::new(landmark.x * frame_width, landmark.y * frame_height);
    }
    Ok(points)
}
