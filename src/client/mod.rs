//! Feed client module.
//!
//! This module provides the main entry point for live timing ingestion.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FeedClient`] | Coordinator owning both ingestion paths |
//! | [`FeedClientBuilder`] | Fluent configuration builder |
//! | [`FeedOptions`] | Every tunable with its default |
//!
//! # Example
//!
//! ```no_run
//! use livetiming::{FeedClient, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = FeedClient::builder().build()?;
//!
//! let season = client.season(2024).await?;
//! let race = &season.meetings[0].sessions[0];
//!
//! let (mut standings, _positions) = client.start_polling(&race.path).await;
//! standings.changed().await.ok();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Core client implementation.
pub mod core;

/// Client options and defaults.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::FeedClientBuilder;
pub use core::{FeedClient, IngestionMode};
pub use options::FeedOptions;
