//! Driver timing derivation.
//!
//! Raw per-car updates from either the polled stream or the live state are
//! reconciled into one [`TimingRecord`] per driver, enriched with roster
//! identity and tyre history.
//!
//! # Data Flow
//!
//! ```text
//! DriverList.json ─► Roster ─────┐
//!                                ├─► Reconciler ─► standings()
//! TimingData stream ─► updates ──┘        ▲
//! TyreStintSeries.json ─► TyreCache ──────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `cache` | Snapshot cache replaced wholesale on refresh |
//! | `format` | Lap time and gap formatting |
//! | `live` | Views over the push-path state |
//! | `reconcile` | Per-driver join and ordering |
//! | `record` | Presentation records |
//! | `roster` | Driver roster |
//! | `tyres` | Tyre stints |

// ============================================================================
// Submodules
// ============================================================================

/// Wholesale-replaced snapshot cache.
pub mod cache;

/// Lap time and gap formatting.
pub mod format;

/// Views over the live state.
pub mod live;

/// Driver reconciliation.
pub mod reconcile;

/// Timing records.
pub mod record;

/// Driver roster.
pub mod roster;

/// Tyre stint history.
pub mod tyres;

// ============================================================================
// Re-exports
// ============================================================================

pub use cache::SharedCache;
pub use format::{format_gap, format_lap_time, format_millis};
pub use live::{circuit_key_from_state, positions_from_state, roster_from_state, standings_from_state};
pub use reconcile::{Reconciler, classify, derive_patch};
pub use record::{BestLapStatus, TimingPatch, TimingRecord, UNRANKED_POSITION};
pub use roster::{Roster, RosterEntry, css_color};
pub use tyres::{TyreCache, TyreStint, stints_from_value};
