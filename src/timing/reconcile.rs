//! Driver reconciliation.
//!
//! Joins raw per-car timing updates against the roster and tyre caches and
//! keeps one evolving [`TimingRecord`] per driver code.
//!
//! # Join Rules
//!
//! | Field | Source |
//! |-------|--------|
//! | code | update `Tla`, else roster by car number, else the car number |
//! | name, team, colour | update, else roster; first seen wins |
//! | position | `Position`, else `Line`; zero counts as absent |
//! | gaps, last lap | unwrapped and formatted, see [`super::format`] |
//! | tyres | tyre cache by car number, attached when listed |

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tracing::trace;

use crate::identifiers::{CarNumber, DriverCode};
use crate::stream::LineUpdate;

use super::cache::SharedCache;
use super::format::{RawField, as_count, as_text, format_gap, format_lap_time};
use super::record::{BestLapStatus, TimingPatch, TimingRecord};
use super::roster::{Roster, css_color};
use super::tyres::TyreCache;

// ============================================================================
// Constants
// ============================================================================

const OVERALL_FASTEST: &str = "OverallFastest";
const PERSONAL_FASTEST: &str = "PersonalFastest";

// ============================================================================
// Reconciler
// ============================================================================

/// Evolving per-driver timing state of one session.
///
/// Records are never removed: a driver, once seen, stays listed for the
/// whole session.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    roster: SharedCache<Roster>,
    tyres: SharedCache<TyreCache>,
    records: Vec<TimingRecord>,
    index: FxHashMap<DriverCode, usize>,
}

impl Reconciler {
    /// Creates a reconciler with empty caches.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reconciler reading from caches refreshed elsewhere.
    #[must_use]
    pub fn with_caches(roster: SharedCache<Roster>, tyres: SharedCache<TyreCache>) -> Self {
        Self {
            roster,
            tyres,
            records: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Returns the roster cache.
    #[inline]
    #[must_use]
    pub fn roster(&self) -> &SharedCache<Roster> {
        &self.roster
    }

    /// Returns the tyre cache.
    #[inline]
    #[must_use]
    pub fn tyres(&self) -> &SharedCache<TyreCache> {
        &self.tyres
    }

    /// Replaces the roster wholesale.
    pub fn set_roster(&self, roster: Roster) {
        self.roster.store(roster);
    }

    /// Folds a tyre refresh into the cache, replacing the cars it mentions.
    pub fn refresh_tyres(&self, fresh: TyreCache) {
        self.tyres.update(|current| current.refreshed(fresh));
    }

    /// Applies one raw update to the record of its driver.
    pub fn apply(&mut self, update: &LineUpdate) {
        let roster = self.roster.load();
        self.apply_with(&roster, update);
    }

    /// Applies a batch of updates in order, returning how many were applied.
    pub fn apply_all<I>(&mut self, updates: I) -> usize
    where
        I: IntoIterator<Item = LineUpdate>,
    {
        let roster = self.roster.load();
        let mut count = 0;
        for update in updates {
            self.apply_with(&roster, &update);
            count += 1;
        }
        count
    }

    fn apply_with(&mut self, roster: &Roster, update: &LineUpdate) {
        let (code, patch) = derive_patch(roster, update);
        trace!(code = %code, car = %update.car_number, "Applying timing patch");

        match self.index.get(&code).copied() {
            Some(slot) => self.records[slot].apply(patch),
            None => {
                let mut record = TimingRecord::new(code.clone());
                record.apply(patch);
                self.index.insert(code, self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Returns the record of a driver code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&TimingRecord> {
        self.index.get(code).map(|&slot| &self.records[slot])
    }

    /// Returns the number of known drivers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no driver has been seen yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lists every known driver by position with current tyre history.
    ///
    /// Unranked drivers sort last; ties keep first-seen order.
    #[must_use]
    pub fn standings(&self) -> Vec<TimingRecord> {
        let roster = self.roster.load();
        let tyres = self.tyres.load();

        let mut listed: Vec<TimingRecord> = self
            .records
            .iter()
            .map(|record| {
                let mut record = record.clone();
                if let Some(stints) = tyre_key(&roster, &record)
                    .and_then(|number| tyres.stints(number.as_str()))
                {
                    record.tyre_history = stints;
                }
                record
            })
            .collect();

        listed.sort_by_key(|record| record.position);
        listed
    }
}

/// Resolves the car number used to look up a record's tyres.
fn tyre_key(roster: &Roster, record: &TimingRecord) -> Option<CarNumber> {
    roster
        .car_number_for(record.driver_code.as_str())
        .cloned()
        .or_else(|| record.driver_code.as_car_number())
        .or_else(|| (!record.car_number.is_empty()).then(|| CarNumber::new(record.car_number.as_str())))
}

// ============================================================================
// Patch Derivation
// ============================================================================

/// Derives the driver code and field patch of one raw update.
#[must_use]
pub fn derive_patch(roster: &Roster, update: &LineUpdate) -> (DriverCode, TimingPatch) {
    let fields = &update.fields;
    let known = roster.by_number(update.car_number.as_str());
    let text = |key: &str| fields.get(key).and_then(as_text).map(str::to_string);

    let code = text("Tla")
        .or_else(|| known.map(|entry| entry.tla.clone()).filter(|tla| !tla.is_empty()))
        .map_or_else(
            || DriverCode::from_car_number(&update.car_number),
            DriverCode::new,
        );

    let patch = TimingPatch {
        car_number: Some(update.car_number.clone()),
        driver_name: text("FullName")
            .or_else(|| text("BroadcastName"))
            .or_else(|| known.map(|entry| entry.display_name().to_string())),
        team_name: text("TeamName").or_else(|| known.map(|entry| entry.team_name.clone())),
        team_color: text("TeamColour")
            .and_then(|hex| css_color(&hex))
            .or_else(|| known.and_then(|entry| entry.team_color())),
        position: fields
            .get("Position")
            .and_then(as_count)
            .filter(|&rank| rank > 0)
            .or_else(|| fields.get("Line").and_then(as_count).filter(|&rank| rank > 0)),
        lap_number: fields.get("NumberOfLaps").and_then(as_count),
        last_lap_time: fields.get("LastLapTime").and_then(format_lap_time),
        gap_to_leader: fields.get("GapToLeader").and_then(format_gap),
        gap_to_ahead: fields.get("IntervalToPositionAhead").and_then(format_gap),
        is_pit: fields.get("InPit").map(|flag| *flag == Value::Bool(true)),
        status: classify(fields),
    };

    (code, patch)
}

/// Classifies the lap and sector flags of an update.
///
/// Returns `None` when the update carries neither lap nor sector data.
#[must_use]
pub fn classify(fields: &Map<String, Value>) -> Option<BestLapStatus> {
    let lap = fields.get("LastLapTime").map(RawField::of);
    let sectors: Vec<RawField<'_>> = match fields.get("Sectors") {
        Some(Value::Array(items)) => items.iter().map(RawField::of).collect(),
        Some(Value::Object(items)) => items.values().map(RawField::of).collect(),
        _ => Vec::new(),
    };

    if lap.is_none() && sectors.is_empty() {
        return None;
    }

    let flagged = |flag: &str| {
        lap.is_some_and(|lap| lap.flag(flag)) || sectors.iter().any(|sector| sector.flag(flag))
    };

    let status = if flagged(OVERALL_FASTEST) {
        BestLapStatus::SessionBest
    } else if flagged(PERSONAL_FASTEST) {
        BestLapStatus::PersonalBest
    } else if sectors.is_empty() && !lap.is_some_and(|lap| has_time(lap.value())) {
        BestLapStatus::None
    } else {
        BestLapStatus::Normal
    };

    Some(status)
}

fn has_time(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        Value::Number(_) => true,
        _ => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
