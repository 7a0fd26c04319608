//! Tyre stint history.
//!
//! Stints arrive per car either from `TyreStintSeries.json`
//! (`{"Stints": {"44": [..]}}`) or from the `TimingAppData` topic
//! (`{"Lines": {"44": {"Stints": [..]}}}`). A refresh replaces the stint list
//! of every car it mentions and leaves other cars alone.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::CarNumber;

use super::format::as_count;

// ============================================================================
// TyreStint
// ============================================================================

/// A contiguous run of laps on one tyre compound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TyreStint {
    /// Compound (`SOFT`, `MEDIUM`, `HARD`, `INTERMEDIATE`, `WET`, `UNKNOWN`).
    pub compound: String,
    /// Whether the set was new when fitted, if known.
    pub new: Option<bool>,
    /// Laps the set had already done when fitted.
    pub start_laps: u32,
    /// Laps the set has done in total.
    pub total_laps: u32,
}

impl TyreStint {
    /// Reads a stint from its raw feed object.
    ///
    /// `New` is sent as either a boolean or the string `"true"`.
    #[must_use]
    pub fn from_value(raw: &Value) -> Option<Self> {
        let raw = raw.as_object()?;
        let new = raw.get("New").and_then(|value| match value {
            Value::Bool(flag) => Some(*flag),
            Value::String(s) => s.parse().ok(),
            _ => None,
        });

        Some(Self {
            compound: raw
                .get("Compound")
                .and_then(Value::as_str)
                .unwrap_or("UNKNOWN")
                .to_string(),
            new,
            start_laps: raw.get("StartLaps").and_then(as_count).unwrap_or(0),
            total_laps: raw.get("TotalLaps").and_then(as_count).unwrap_or(0),
        })
    }

    /// Laps driven on this set during the stint.
    #[inline]
    #[must_use]
    pub fn stint_laps(&self) -> u32 {
        self.total_laps.saturating_sub(self.start_laps)
    }
}

/// Reads a stint collection given as a list or as an index-keyed map.
#[must_use]
pub fn stints_from_value(raw: &Value) -> Vec<TyreStint> {
    match raw {
        Value::Array(items) => items.iter().filter_map(TyreStint::from_value).collect(),
        Value::Object(items) => {
            let mut indexed: Vec<(u32, TyreStint)> = items
                .iter()
                .filter_map(|(index, item)| {
                    Some((index.parse().ok()?, TyreStint::from_value(item)?))
                })
                .collect();
            indexed.sort_by_key(|(index, _)| *index);
            indexed.into_iter().map(|(_, stint)| stint).collect()
        }
        _ => Vec::new(),
    }
}

// ============================================================================
// TyreCache
// ============================================================================

/// Stint lists keyed by car number.
///
/// Lists are shared by reference, so handing one to a record is cheap and a
/// later refresh never mutates a list already handed out.
#[derive(Debug, Clone, Default)]
pub struct TyreCache {
    by_car: FxHashMap<CarNumber, Arc<[TyreStint]>>,
}

impl TyreCache {
    /// Creates an empty cache.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `TyreStintSeries.json`: `{"Stints": {carNumber: [stint, ..]}}`.
    #[must_use]
    pub fn from_stint_series(value: &Value) -> Self {
        value
            .get("Stints")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .map(|(number, stints)| (CarNumber::new(number.as_str()), stints_from_value(stints)))
            .collect()
    }

    /// Parses the `TimingAppData` topic: `{"Lines": {carNumber: {"Stints": ..}}}`.
    #[must_use]
    pub fn from_timing_app_data(value: &Value) -> Self {
        value
            .get("Lines")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .filter_map(|(number, line)| {
                let stints = line.get("Stints")?;
                Some((CarNumber::new(number.as_str()), stints_from_value(stints)))
            })
            .collect()
    }

    /// Returns a copy of this cache with every car of `fresh` replaced.
    #[must_use]
    pub fn refreshed(&self, fresh: Self) -> Self {
        let mut by_car = self.by_car.clone();
        by_car.extend(fresh.by_car);
        Self { by_car }
    }

    /// Returns the stints of a car.
    #[inline]
    #[must_use]
    pub fn stints(&self, number: &str) -> Option<Arc<[TyreStint]>> {
        self.by_car.get(number).cloned()
    }

    /// Returns the number of cars with stint data.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_car.len()
    }

    /// Returns `true` if no car has stint data.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_car.is_empty()
    }
}

impl FromIterator<(CarNumber, Vec<TyreStint>)> for TyreCache {
    fn from_iter<I: IntoIterator<Item = (CarNumber, Vec<TyreStint>)>>(iter: I) -> Self {
        Self {
            by_car: iter
                .into_iter()
                .map(|(number, stints)| (number, Arc::from(stints)))
                .collect(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
