//! World-to-screen coordinate transform.
//!
//! Circuit coordinates use a Y-up world frame. Screens are Y-down, and each
//! circuit has a rotation that orients it as broadcast graphics do. Both the
//! track polyline and every car position go through the same transform with
//! the same rotation, so cars always sit on the drawn track.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Point
// ============================================================================

/// A 2D point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Inverts the Y axis, then rotates about the origin.
    #[inline]
    #[must_use]
    pub fn project(self, rotation: Rotation) -> Self {
        let y = -self.y;
        Self {
            x: self.x * rotation.cos - y * rotation.sin,
            y: self.x * rotation.sin + y * rotation.cos,
        }
    }
}

impl From<(f64, f64)> for Point {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Rotation
// ============================================================================

/// A precomputed rotation, reused across every point of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    sin: f64,
    cos: f64,
}

impl Rotation {
    /// Creates a rotation from an angle in degrees.
    #[must_use]
    pub fn degrees(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self { sin, cos }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self { sin: 0.0, cos: 1.0 }
    }
}

// ============================================================================
// Transform
// ============================================================================

/// Projects world points into screen space.
///
/// The Y axis is inverted first, then the points are rotated by
/// `rotation_degrees`. At rotation `0` the result is exactly the Y-inverted
/// input.
#[must_use]
pub fn transform(points: &[Point], rotation_degrees: f64) -> Vec<Point> {
    let rotation = Rotation::degrees(rotation_degrees);
    points.iter().map(|point| point.project(rotation)).collect()
}

/// Projects a polyline given as parallel coordinate arrays.
///
/// Extra coordinates on the longer side are ignored.
#[must_use]
pub fn transform_xy(x: &[f64], y: &[f64], rotation_degrees: f64) -> Vec<Point> {
    let rotation = Rotation::degrees(rotation_degrees);
    x.iter()
        .zip(y)
        .map(|(&x, &y)| Point::new(x, y).project(rotation))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
    }

    #[test]
    fn test_zero_rotation_inverts_y() {
        assert_eq!(transform(&[Point::new(3.0, 4.0)], 0.0), [Point::new(3.0, -4.0)]);
    }

    #[test]
    fn test_half_turn_negates_both_axes() {
        let out = transform(&[Point::new(3.0, 4.0)], 180.0);
        assert!(close(out[0], Point::new(-3.0, 4.0)));
    }

    #[test]
    fn test_quarter_turn() {
        // (1, 0) -> inverted (1, 0) -> rotated 90 degrees -> (0, 1)
        let out = transform(&[Point::new(1.0, 0.0)], 90.0);
        assert!(close(out[0], Point::new(0.0, 1.0)));
    }

    #[test]
    fn test_transform_xy_zips_arrays() {
        let out = transform_xy(&[1.0, 2.0, 3.0], &[5.0, 6.0], 0.0);
        assert_eq!(out, [Point::new(1.0, -5.0), Point::new(2.0, -6.0)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(transform(&[], 45.0).is_empty());
    }

    proptest! {
        #[test]
        fn test_rotation_preserves_distance(
            x in -10_000.0f64..10_000.0,
            y in -10_000.0f64..10_000.0,
            degrees in -360.0f64..360.0,
        ) {
            let out = transform(&[Point::new(x, y)], degrees)[0];
            let before = x.hypot(y);
            let after = out.x.hypot(out.y);
            prop_assert!((before - after).abs() < 1e-6);
        }

        #[test]
        fn test_full_turn_is_inversion(x in -1_000.0f64..1_000.0, y in -1_000.0f64..1_000.0) {
            let out = transform(&[Point::new(x, y)], 360.0)[0];
            prop_assert!((out.x - x).abs() < 1e-6);
            prop_assert!((out.y + y).abs() < 1e-6);
        }
    }
}
