//! Car position snapshots.
//!
//! Positions come either from the `Position` topic of the live state or from
//! the polled `Position.z.jsonStream`, whose lines hold a timestamp followed
//! by a compressed payload. Only the latest snapshot matters: samples are
//! replaced every tick and never kept.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Map, Value};

use crate::identifiers::CarNumber;
use crate::protocol::try_inflate;

use super::parser::TIMESTAMP;

// ============================================================================
// PositionSample
// ============================================================================

/// Instantaneous world-space position of one car.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    /// Car the sample belongs to.
    pub car_number: CarNumber,
    /// World X.
    pub x: f64,
    /// World Y.
    pub y: f64,
    /// World Z (elevation).
    pub z: f64,
}

impl PositionSample {
    /// Reads a sample from an `{"X":..,"Y":..,"Z":..}` entry.
    ///
    /// Missing coordinates default to zero; non-object entries yield `None`.
    #[must_use]
    pub fn from_entry(car_number: &str, entry: &Value) -> Option<Self> {
        let entry = entry.as_object()?;
        let coordinate = |key: &str| entry.get(key).and_then(Value::as_f64).unwrap_or(0.0);

        Some(Self {
            car_number: CarNumber::new(car_number),
            x: coordinate("X"),
            y: coordinate("Y"),
            z: coordinate("Z"),
        })
    }
}

// ============================================================================
// Snapshot Extraction
// ============================================================================

/// Extracts samples from a position payload.
///
/// Accepts the feed shape `{"Position":[{"Timestamp":..,"Entries":{..}}]}`
/// (the last entry wins), a single `{"Entries":{..}}` object, or a flat map
/// from car number to coordinates.
#[must_use]
pub fn samples_from_snapshot(value: &Value) -> Vec<PositionSample> {
    let inner = value.get("Position").unwrap_or(value);

    let entries = match inner {
        Value::Array(frames) => frames.last().and_then(entries_of),
        Value::Object(_) => entries_of(inner).or_else(|| inner.as_object()),
        _ => None,
    };

    entries
        .into_iter()
        .flatten()
        .filter_map(|(number, entry)| PositionSample::from_entry(number, entry))
        .collect()
}

fn entries_of(frame: &Value) -> Option<&Map<String, Value>> {
    frame.get("Entries").and_then(Value::as_object)
}

/// Returns the last well-formed position payload of a raw stream.
///
/// Lines are scanned from the end; the first one that parses as JSON (after
/// inflation, for compressed lines) and carries a `Position` field wins.
#[must_use]
pub fn latest_position_snapshot(raw: &str) -> Option<Value> {
    raw.lines().rev().find_map(parse_position_line)
}

fn parse_position_line(line: &str) -> Option<Value> {
    let line = line.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let body = match TIMESTAMP.find(line) {
        Some(m) if m.start() == 0 => &line[m.end()..],
        _ => line,
    };

    let value = match serde_json::from_str::<Value>(body).ok()? {
        Value::String(encoded) => try_inflate(&encoded).ok()?,
        other => other,
    };

    value.get("Position").is_some().then_some(value)
}

// ============================================================================
// Tests
// ============================================================================
