//! Live timing - motor-racing timing feed ingestion.
//!
//! This library turns the public live timing service into a continuously
//! updated, reconciled view of a session: per-driver timing rows, tyre
//! history and car positions on the circuit map.
//!
//! # Architecture
//!
//! Two ingestion paths feed the same reconciliation layer:
//!
//! - **Push (live)**: negotiate with the streaming hub, hold a socket open,
//!   deep-merge every partial topic update into a [`LiveState`]
//! - **Pull (polling)**: fetch the archived `.jsonStream` files of a session
//!   at a fixed interval and replay them through the same reconciler
//!
//! Key design principles:
//!
//! - Only one path drives a [`FeedClient`] at a time
//! - Snapshots are immutable `Arc`s published over `watch` channels
//! - Stopped tasks can never publish again (generation-guarded)
//! - Malformed frames and blocks are dropped, never fatal
//!
//! # Quick Start
//!
//! ```no_run
//! use livetiming::{FeedClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = FeedClient::builder().build()?;
//!
//!     client.connect_live().await;
//!     let mut states = client.live().subscribe();
//!
//!     while states.changed().await.is_ok() {
//!         for record in client.standings() {
//!             println!("{:>3} {} {}", record.position, record.driver_code, record.gap_to_leader);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`FeedClient`] coordinator, builder and options |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Car number and driver code newtypes |
//! | [`polling`] | Static archive client and polling session |
//! | [`protocol`] | Hub frames, decompression, deep merge |
//! | [`stream`] | Archived `.jsonStream` parsing |
//! | [`timing`] | Roster, tyres, formatting, reconciliation |
//! | [`track`] | Circuit geometry and car markers |
//! | [`transport`] | Hub negotiation and live socket |

// ============================================================================
// Modules
// ============================================================================

/// Feed client coordinator.
///
/// Use [`FeedClient::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for cars and drivers.
pub mod identifiers;

/// Pull path: static archive and polling loops.
pub mod polling;

/// Hub message types and state merging.
pub mod protocol;

/// Archived stream parsing.
pub mod stream;

/// Timing reconciliation.
pub mod timing;

/// Circuit map helpers.
pub mod track;

/// Push path: negotiation and live socket.
pub mod transport;

mod lifecycle;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{FeedClient, FeedClientBuilder, FeedOptions, IngestionMode};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CarNumber, DriverCode};

// Ingestion types
pub use polling::{PollingSession, Season, StaticClient};
pub use protocol::LiveState;
pub use transport::{ConnectionStatus, LiveConnection};

// View types
pub use stream::PositionSample;
pub use timing::{BestLapStatus, Roster, TimingRecord, TyreStint};
pub use track::{CarMarker, Point, TrackGeometry};
