//! Session roster.
//!
//! Static per-session driver metadata from the `DriverList` topic or
//! `DriverList.json`. Built once per fetch and never patched; a fresh fetch
//! replaces the whole roster.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identifiers::{CarNumber, DriverCode};

// ============================================================================
// RosterEntry
// ============================================================================

/// Driver metadata for one car.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RosterEntry {
    /// Racing number.
    pub racing_number: String,
    /// Three-letter code.
    pub tla: String,
    /// Full name (`"Max VERSTAPPEN"`).
    pub full_name: String,
    /// Broadcast name (`"M VERSTAPPEN"`).
    pub broadcast_name: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Team name.
    pub team_name: String,
    /// Team colour as hex without `#`.
    pub team_colour: String,
    /// Headshot image URL.
    pub headshot_url: String,
}

impl RosterEntry {
    /// Best available display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        [&self.full_name, &self.broadcast_name, &self.last_name]
            .into_iter()
            .find(|name| !name.is_empty())
            .map_or("", String::as_str)
    }

    /// Team colour as `#rrggbb`, or `None` when unknown.
    #[must_use]
    pub fn team_color(&self) -> Option<String> {
        css_color(&self.team_colour)
    }
}

/// Prefixes a bare hex colour with `#`.
#[must_use]
pub fn css_color(hex: &str) -> Option<String> {
    match hex {
        "" => None,
        h if h.starts_with('#') => Some(h.to_string()),
        h => Some(format!("#{h}")),
    }
}

// ============================================================================
// Roster
// ============================================================================

/// Roster indexed by racing number and by driver code.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    by_number: FxHashMap<CarNumber, Arc<RosterEntry>>,
    by_code: FxHashMap<DriverCode, CarNumber>,
}

impl Roster {
    /// Creates an empty roster.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a roster from a `{carNumber: entry}` mapping.
    ///
    /// Entries that are not objects (`"_kf": true`) are skipped; an entry
    /// without `RacingNumber` takes its map key. Non-string fields are
    /// ignored.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let entries = value
            .as_object()
            .into_iter()
            .flatten()
            .filter_map(|(number, raw)| {
                let fields: Map<String, Value> = raw
                    .as_object()?
                    .iter()
                    .filter(|(_, field)| field.is_string())
                    .map(|(key, field)| (key.clone(), field.clone()))
                    .collect();
                let mut entry = RosterEntry::deserialize(Value::Object(fields)).ok()?;
                if entry.racing_number.is_empty() {
                    entry.racing_number.clone_from(number);
                }
                Some(entry)
            });

        entries.collect()
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, entry: RosterEntry) {
        let number = CarNumber::new(entry.racing_number.as_str());
        if !entry.tla.is_empty() {
            self.by_code
                .insert(DriverCode::new(entry.tla.as_str()), number.clone());
        }
        self.by_number.insert(number, Arc::new(entry));
    }

    /// Looks up an entry by racing number.
    #[inline]
    #[must_use]
    pub fn by_number(&self, number: &str) -> Option<&RosterEntry> {
        self.by_number.get(number).map(Arc::as_ref)
    }

    /// Looks up an entry by driver code.
    #[must_use]
    pub fn by_code(&self, code: &str) -> Option<&RosterEntry> {
        self.by_code
            .get(code)
            .and_then(|number| self.by_number(number.as_str()))
    }

    /// Reverse lookup from driver code to racing number.
    #[inline]
    #[must_use]
    pub fn car_number_for(&self, code: &str) -> Option<&CarNumber> {
        self.by_code.get(code)
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    /// Returns `true` if the roster is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }
}

impl FromIterator<RosterEntry> for Roster {
    fn from_iter<I: IntoIterator<Item = RosterEntry>>(iter: I) -> Self {
        let mut roster = Self::new();
        for entry in iter {
            roster.insert(entry);
        }
        roster
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn sample() -> Value {
        json!({
            "1": {"RacingNumber": "1", "Tla": "VER", "FullName": "Max VERSTAPPEN",
                  "TeamName": "Red Bull Racing", "TeamColour": "3671C6"},
            "44": {"Tla": "HAM", "BroadcastName": "L HAMILTON", "TeamName": "Mercedes"},
            "_kf": true
        })
    }

    #[test]
    fn test_from_value_indexes_both_keys() {
        let roster = Roster::from_value(&sample());
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.by_number("1").unwrap().tla, "VER");
        assert_eq!(roster.by_code("HAM").unwrap().racing_number, "44");
        assert_eq!(roster.car_number_for("VER"), Some(&CarNumber::new("1")));
        assert!(roster.by_code("ALO").is_none());
    }

    #[test]
    fn test_display_name_fallbacks() {
        let roster = Roster::from_value(&sample());
        assert_eq!(roster.by_number("1").unwrap().display_name(), "Max VERSTAPPEN");
        assert_eq!(roster.by_number("44").unwrap().display_name(), "L HAMILTON");
        assert_eq!(RosterEntry::default().display_name(), "");
    }

    #[test]
    fn test_team_color() {
        let roster = Roster::from_value(&sample());
        assert_eq!(
            roster.by_number("1").unwrap().team_color().as_deref(),
            Some("#3671C6")
        );
        assert_eq!(roster.by_number("44").unwrap().team_color(), None);
        assert_eq!(css_color("#FFFFFF").as_deref(), Some("#FFFFFF"));
    }

    #[test]
    fn test_non_object_input_is_empty() {
        assert!(Roster::from_value(&json!([1, 2])).is_empty());
        assert!(Roster::from_value(&Value::Null).is_empty());
    }
}
