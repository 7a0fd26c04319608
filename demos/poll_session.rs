//! Archived session replay.
//!
//! Demonstrates:
//! - Listing a season catalog
//! - Polling the archived streams of one session
//! - Stopping the polling loops
//!
//! Usage:
//!   cargo run --example poll_session -- 2024
//!   cargo run --example poll_session -- 2024 9158

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::{Context, bail};
use common::Args;
use livetiming::FeedClient;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_YEAR: u16 = 2024;
const UPDATES: usize = 5;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    common::init_logging(args.debug);

    let year = match args.positional.first() {
        Some(raw) => raw.parse().context("year must be a number")?,
        None => DEFAULT_YEAR,
    };

    let client = FeedClient::builder()
        .poll_interval(Duration::from_secs(2))
        .build()?;

    let season = client.season(year).await?;
    println!("=== {} season: {} meetings ===\n", season.year, season.meetings.len());

    for (meeting, session) in season.sessions() {
        println!("  {:>5}  {:<28} {}", session.key, meeting.name, session.name);
    }

    let session = match args.positional.get(1) {
        Some(raw) => {
            let key: u32 = raw.parse().context("session key must be a number")?;
            season.session(key).context("unknown session key")?
        }
        None => match season.sessions().map(|(_, s)| s).filter(|s| !s.path.is_empty()).last() {
            Some(session) => session,
            None => bail!("season {year} has no archived sessions"),
        },
    };

    println!("\n=== Polling {} ({}) ===\n", session.name, session.path);
    let (mut standings, _positions) = client.start_polling(&session.path).await;

    for _ in 0..UPDATES {
        standings.changed().await?;
        let table = standings.borrow_and_update().clone();
        common::print_standings(&table);
    }

    client.stop().await;
    Ok(())
}
