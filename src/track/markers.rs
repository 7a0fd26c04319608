//! Car markers for track maps.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::identifiers::CarNumber;
use crate::stream::PositionSample;
use crate::timing::Roster;

use super::transform::{Point, Rotation};

// ============================================================================
// Constants
// ============================================================================

/// Marker colour of a driver whose team colour is unknown.
pub const DEFAULT_MARKER_COLOR: &str = "#000000";

// ============================================================================
// CarMarker
// ============================================================================

/// A projected car position with its roster identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarMarker {
    /// Racing number.
    pub car_number: CarNumber,
    /// Three-letter code, empty when the roster has none.
    pub driver_code: String,
    /// Team colour as `#rrggbb`.
    pub team_color: String,
    /// Screen-space position.
    pub point: Point,
}

/// Joins position samples with the roster and projects them.
///
/// Samples of cars missing from the roster are dropped.
#[must_use]
pub fn car_markers(samples: &[PositionSample], roster: &Roster, rotation_degrees: f64) -> Vec<CarMarker> {
    let rotation = Rotation::degrees(rotation_degrees);

    samples
        .iter()
        .filter_map(|sample| {
            let entry = roster.by_number(sample.car_number.as_str())?;
            Some(CarMarker {
                car_number: sample.car_number.clone(),
                driver_code: entry.tla.clone(),
                team_color: entry
                    .team_color()
                    .unwrap_or_else(|| DEFAULT_MARKER_COLOR.to_string()),
                point: Point::new(sample.x, sample.y).project(rotation),
            })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
