//! Derived views over the push-path [`LiveState`].
//!
//! The live feed carries roster, timing and tyre data as separate topics.
//! These helpers run them through the same reconciliation as the poll path.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::protocol::LiveState;
use crate::stream::{PositionSample, lines_of, samples_from_snapshot};

use super::reconcile::Reconciler;
use super::record::TimingRecord;
use super::roster::Roster;
use super::tyres::TyreCache;

// ============================================================================
// Topic Names
// ============================================================================

/// Roster topic.
pub const DRIVER_LIST: &str = "DriverList";

/// Per-car timing topic.
pub const TIMING_DATA: &str = "TimingData";

/// Per-car auxiliary timing topic carrying tyre stints.
pub const TIMING_APP_DATA: &str = "TimingAppData";

/// Car coordinates topic (inflated from `Position.z`).
pub const POSITION: &str = "Position";

// ============================================================================
// Views
// ============================================================================

/// Builds the roster from the `DriverList` topic.
#[must_use]
pub fn roster_from_state(state: &LiveState) -> Roster {
    state
        .topic(DRIVER_LIST)
        .map(Roster::from_value)
        .unwrap_or_default()
}

/// Derives the ordered timing table from a live state snapshot.
#[must_use]
pub fn standings_from_state(state: &LiveState) -> Vec<TimingRecord> {
    let mut reconciler = Reconciler::new();
    reconciler.set_roster(roster_from_state(state));
    if let Some(app_data) = state.topic(TIMING_APP_DATA) {
        reconciler.refresh_tyres(TyreCache::from_timing_app_data(app_data));
    }
    if let Some(timing) = state.topic(TIMING_DATA) {
        reconciler.apply_all(lines_of("", timing));
    }
    reconciler.standings()
}

/// Extracts car positions from a live state snapshot.
#[must_use]
pub fn positions_from_state(state: &LiveState) -> Vec<PositionSample> {
    state
        .topic(POSITION)
        .map(samples_from_snapshot)
        .unwrap_or_default()
}

/// Returns the circuit key announced in the `SessionInfo` topic.
#[must_use]
pub fn circuit_key_from_state(state: &LiveState) -> Option<u32> {
    let key = state.topic("SessionInfo")?.get("Meeting")?.get("Circuit")?.get("Key")?;
    match key {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn state() -> LiveState {
        let mut state = LiveState::new();
        state.apply_topic(
            DRIVER_LIST,
            json!({
                "1": {"RacingNumber": "1", "Tla": "VER", "FullName": "Max VERSTAPPEN", "TeamColour": "3671C6"},
                "16": {"RacingNumber": "16", "Tla": "LEC", "FullName": "Charles LECLERC"}
            }),
        );
        state.apply_topic(
            TIMING_DATA,
            json!({"Lines": {
                "1": {"Position": "2", "GapToLeader": "+1.1"},
                "16": {"Position": "1", "GapToLeader": ""}
            }}),
        );
        state.apply_topic(
            TIMING_APP_DATA,
            json!({"Lines": {"16": {"Stints": [{"Compound": "SOFT", "TotalLaps": 3}]}}}),
        );
        state.apply_topic(
            POSITION,
            json!({"Position": [{"Entries": {"1": {"X": 1, "Y": 2, "Z": 0}}}]}),
        );
        state.apply_topic("SessionInfo", json!({"Meeting": {"Circuit": {"Key": 63}}}));
        state
    }

    #[test]
    fn test_standings_from_state() {
        let standings = standings_from_state(&state());
        let codes: Vec<_> = standings.iter().map(|r| r.driver_code.as_str()).collect();
        assert_eq!(codes, ["LEC", "VER"]);
        assert_eq!(standings[0].tyre_history[0].compound, "SOFT");
        assert_eq!(standings[1].team_color, "#3671C6");
        assert_eq!(standings[1].gap_to_leader, "+1.1");
    }

    #[test]
    fn test_empty_state_views() {
        let empty = LiveState::new();
        assert!(standings_from_state(&empty).is_empty());
        assert!(positions_from_state(&empty).is_empty());
        assert!(roster_from_state(&empty).is_empty());
        assert_eq!(circuit_key_from_state(&empty), None);
    }

    #[test]
    fn test_positions_and_circuit() {
        let state = state();
        let positions = positions_from_state(&state);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].y, 2.0);
        assert_eq!(circuit_key_from_state(&state), Some(63));
    }
}
