//! Minimal enclosing circle fit for a 4-point iris ring.
//!
//! The point count is fixed at 4, so the solver can afford to enumerate every
//! candidate circle: one per point pair (diameter hypothesis) and one per
//! point triple (circumcircle hypothesis), then keep the smallest candidate
//! that contains all four points. This is not a general-purpose minimal
//! enclosing circle algorithm; it is only exact for the fixed small set size
//! it is used with.

use crate::{
    constants::{COLINEARITY_EPSILON, CONTAINMENT_TOLERANCE},
    landmarks::PixelPoint,
};

/// A circle in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Circle center
    pub center: PixelPoint,
    /// Circle radius, non-negative
    pub radius: f64,
}

impl Circle {
    /// Whether a point lies inside the circle, within the containment tolerance
    #[must_use]
    pub fn contains(&self, point: &PixelPoint) -> bool {
        self.center.distance(point) <= self.radius + CONTAINMENT_TOLERANCE
    }
}

/// One eye's iris measurement for a single frame
#[derive(Debug, Clone, Copy)]
pub struct IrisMeasurement {
    /// Iris center in pixel coordinates
    pub center: PixelPoint,
    /// Apparent iris diameter in pixels
    pub diameter_px: f64,
}

/// Fit the minimal enclosing circle of a 4-point iris ring
#[must_use]
pub fn min_enclosing_circle(points: &[PixelPoint; 4]) -> Circle {
    let mut best: Option<Circle> = None;

    let mut consider = |candidate: Circle| {
        if points.iter().all(|p| candidate.contains(p)) {
            match best {
                Some(current) if current.radius <= candidate.radius => {}
                _ => best = Some(candidate),
            }
        }
    };

    // Diameter hypotheses: one circle per point pair
    for i in 0..4 {
        for j in (i + 1)..4 {
            consider(circle_from_pair(&points[i], &points[j]));
        }
    }

    // Circumcircle hypotheses: one circle per point triple
    for i in 0..4 {
        for j in (i + 1)..4 {
            for k in (j + 1)..4 {
                if let Some(candidate) = circle_from_triple(&points[i], &points[j], &points[k]) {
                    consider(candidate);
                }
            }
        }
    }

    best.unwrap_or_else(|| {
        log::debug!("All circle hypotheses infeasible, using centroid fallback");
        centroid_fallback(points)
    })
}

/// Measure an iris from its 4-point ring
#[must_use]
pub fn measure_iris(ring: &[PixelPoint; 4]) -> IrisMeasurement {
    let circle = min_enclosing_circle(ring);
    IrisMeasurement {
        center: circle.center,
        diameter_px: 2.0 * circle.radius,
    }
}

/// Circle with the pair as a diameter
fn circle_from_pair(a: &PixelPoint, b: &PixelPoint) -> Circle {
    let center = PixelPoint::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    Circle {
        center,
        radius: a.distance(b) / 2.0,
    }
}

/// Circumscribed circle of a point triple
///
/// Returns `None` when the triple is near-colinear; the orientation
/// determinant is then too small for a numerically stable center.
fn circle_from_triple(a: &PixelPoint, b: &PixelPoint, c: &PixelPoint) -> Option<Circle> {
    let det = a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y);
    if det.abs() < COLINEARITY_EPSILON {
        return None;
    }
    let d = 2.0 * det;

    let a_sq = a.x * a.x + a.y * a.y;
    let b_sq = b.x * b.x + b.y * b.y;
    let c_sq = c.x * c.x + c.y * c.y;

    let ux = (a_sq * (b.y - c.y) + b_sq * (c.y - a.y) + c_sq * (a.y - b.y)) / d;
    let uy = (a_sq * (c.x - b.x) + b_sq * (a.x - c.x) + c_sq * (b.x - a.x)) / d;

    let center = PixelPoint::new(ux, uy);
    let radius = center.distance(a);
    Some(Circle { center, radius })
}

/// Approximate fallback for numerically degenerate rings: centroid center,
/// mean point distance as radius. Not guaranteed minimal.
fn centroid_fallback(points: &[PixelPoint; 4]) -> Circle {
    let n = points.len() as f64;
    let center = PixelPoint::new(
        points.iter().map(|p| p.x).sum::<f64>() / n,
        points.iter().map(|p| p.y).sum::<f64>() / n,
    );
    let radius = points.iter().map(|p| center.distance(p)).sum::<f64>() / n;
    Circle { center, radius }
}
