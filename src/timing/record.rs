//! Presentation-ready timing records.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;

use crate::identifiers::{CarNumber, DriverCode};

use super::tyres::TyreStint;

// ============================================================================
// Constants
// ============================================================================

/// Position of a driver that has not been ranked yet; sorts last.
pub const UNRANKED_POSITION: u32 = 999;

// ============================================================================
// BestLapStatus
// ============================================================================

/// Highlight class of a driver's latest lap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BestLapStatus {
    /// Fastest lap or sector of the driver so far.
    PersonalBest,
    /// Fastest lap or sector of anyone in the session.
    SessionBest,
    /// A lap without any fastest flag.
    #[default]
    Normal,
    /// No lap time to classify.
    None,
}

impl BestLapStatus {
    /// Returns the wire name (`personal-best`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PersonalBest => "personal-best",
            Self::SessionBest => "session-best",
            Self::Normal => "normal",
            Self::None => "none",
        }
    }
}

// ============================================================================
// TimingPatch
// ============================================================================

/// Fields derived from one raw update; `None` means "not in this update".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingPatch {
    /// Racing number the update was keyed by.
    pub car_number: Option<CarNumber>,
    /// Driver name.
    pub driver_name: Option<String>,
    /// Team name.
    pub team_name: Option<String>,
    /// Team colour as `#rrggbb`.
    pub team_color: Option<String>,
    /// Running position.
    pub position: Option<u32>,
    /// Completed laps.
    pub lap_number: Option<u32>,
    /// Formatted last lap time.
    pub last_lap_time: Option<String>,
    /// Formatted gap to the leader.
    pub gap_to_leader: Option<String>,
    /// Formatted gap to the car ahead.
    pub gap_to_ahead: Option<String>,
    /// In pit lane.
    pub is_pit: Option<bool>,
    /// Lap classification.
    pub status: Option<BestLapStatus>,
}

// ============================================================================
// TimingRecord
// ============================================================================

/// Per-driver view consumed by timing tables and track maps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingRecord {
    /// Running position, [`UNRANKED_POSITION`] until known.
    pub position: u32,
    /// Three-letter code, or the racing number when unknown.
    pub driver_code: DriverCode,
    /// Racing number, empty until an update names it.
    pub car_number: String,
    /// Driver name.
    pub driver_name: String,
    /// Team name.
    pub team_name: String,
    /// Team colour as `#rrggbb`.
    pub team_color: String,
    /// Completed laps.
    pub lap_number: u32,
    /// Last lap time (`1:23.456`).
    pub last_lap_time: String,
    /// Gap to the leader (`+1.234`, `Leader`).
    pub gap_to_leader: String,
    /// Gap to the car ahead.
    pub gap_to_ahead: String,
    /// In pit lane.
    pub is_pit: bool,
    /// Lap classification.
    pub status: BestLapStatus,
    /// Stints of the current tyre cache, attached when listed.
    pub tyre_history: Arc<[TyreStint]>,
}

impl TimingRecord {
    /// Creates a record with defaults for a newly seen driver.
    #[must_use]
    pub fn new(driver_code: DriverCode) -> Self {
        Self {
            position: UNRANKED_POSITION,
            driver_code,
            car_number: String::new(),
            driver_name: String::new(),
            team_name: String::new(),
            team_color: String::new(),
            lap_number: 0,
            last_lap_time: String::new(),
            gap_to_leader: String::new(),
            gap_to_ahead: String::new(),
            is_pit: false,
            status: BestLapStatus::Normal,
            tyre_history: Arc::from(Vec::new()),
        }
    }

    /// Returns `true` once the driver has a running position.
    #[inline]
    #[must_use]
    pub fn is_ranked(&self) -> bool {
        self.position != UNRANKED_POSITION
    }

    /// Overlays the fields present in `patch`.
    ///
    /// Identity fields (name, team, colour) are first-seen-wins: once known
    /// they are never replaced or blanked.
    pub fn apply(&mut self, patch: TimingPatch) {
        fn keep_first(slot: &mut String, incoming: Option<String>) {
            if slot.is_empty()
                && let Some(value) = incoming.filter(|v| !v.is_empty())
            {
                *slot = value;
            }
        }

        if let Some(number) = patch.car_number {
            self.car_number = number.as_str().to_string();
        }
        keep_first(&mut self.driver_name, patch.driver_name);
        keep_first(&mut self.team_name, patch.team_name);
        keep_first(&mut self.team_color, patch.team_color);

        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(lap) = patch.lap_number {
            self.lap_number = lap;
        }
        if let Some(time) = patch.last_lap_time {
            self.last_lap_time = time;
        }
        if let Some(gap) = patch.gap_to_leader {
            self.gap_to_leader = gap;
        }
        if let Some(gap) = patch.gap_to_ahead {
            self.gap_to_ahead = gap;
        }
        if let Some(in_pit) = patch.is_pit {
            self.is_pit = in_pit;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
