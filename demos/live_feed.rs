//! Live feed follower.
//!
//! Demonstrates:
//! - Connecting to the streaming hub
//! - Watching connection status changes
//! - Printing the reconciled timing table on every state change
//! - Projecting car positions onto the circuit layout
//!
//! Usage:
//!   cargo run --example live_feed
//!   cargo run --example live_feed -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::Args;
use livetiming::timing::circuit_key_from_state;
use livetiming::track::car_markers;
use livetiming::{FeedClient, Result, TrackGeometry};
use tracing::warn;

// ============================================================================
// Constants
// ============================================================================

/// Minimum time between two printed tables.
const PRINT_INTERVAL: Duration = Duration::from_secs(2);

/// Season whose circuit layouts are drawn.
const LAYOUT_YEAR: u16 = 2024;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    println!("=== Live Feed ===\n");

    let client = FeedClient::builder().build()?;
    client.connect_live().await;

    let mut status = client.live().status_changes();
    let mut states = client.live().subscribe();
    let mut layout: Option<TrackGeometry> = None;

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("[Status] {:?}", *status.borrow_and_update());
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = states.borrow_and_update().clone();

                if layout.is_none()
                    && let Some(key) = circuit_key_from_state(&snapshot)
                {
                    match client.track_geometry(key, LAYOUT_YEAR).await {
                        Ok(geometry) => layout = Some(geometry),
                        Err(e) => warn!("Circuit layout unavailable: {e}"),
                    }
                }

                common::print_standings(&client.standings());

                if let Some(geometry) = &layout {
                    let roster = livetiming::timing::roster_from_state(&snapshot);
                    for marker in car_markers(&client.positions(), &roster, geometry.rotation) {
                        println!(
                            "  {:<4} {:>9.1} {:>9.1} {}",
                            marker.driver_code, marker.point.x, marker.point.y, marker.team_color
                        );
                    }
                }

                tokio::time::sleep(PRINT_INTERVAL).await;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.stop().await;
    println!("Stopped");
    Ok(())
}
