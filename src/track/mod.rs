//! Track map support.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `geometry` | Circuit layouts and their sources |
//! | `markers` | Car markers joined with the roster |
//! | `transform` | World-to-screen projection |

/// Circuit geometry lookup.
pub mod geometry;

/// Car markers.
pub mod markers;

/// Coordinate transform.
pub mod transform;

pub use geometry::{GeometrySource, HttpGeometrySource, StaticGeometrySource, TrackGeometry};
pub use markers::{CarMarker, DEFAULT_MARKER_COLOR, car_markers};
pub use transform::{Point, Rotation, transform, transform_xy};
