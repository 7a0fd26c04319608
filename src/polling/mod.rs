//! Poll-path ingestion.
//!
//! An alternative to the live socket: the static archive is fetched over
//! plain HTTP on a fixed cadence and run through the stream parser and the
//! driver reconciliation.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `catalog` | Season, meeting and session catalog |
//! | `client` | Static resource fetches |
//! | `session` | Polling loops of one session |

/// Season catalog.
pub mod catalog;

/// Static resource client.
pub mod client;

/// Polling session.
pub mod session;

pub use catalog::{Circuit, Country, Meeting, Season, Session};
pub use client::{StaticClient, session_file};
pub use session::{PollIntervals, PollingSession, Positions, Standings};
