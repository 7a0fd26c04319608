//! Shared utilities for the demos.

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for the demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub positional: Vec<String>,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            positional: args.into_iter().filter(|a| !a.starts_with("--")).collect(),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing, honouring `RUST_LOG` when set.
pub fn init_logging(debug: bool) {
    let fallback = if debug { "livetiming=debug" } else { "livetiming=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Prints a timing table.
pub fn print_standings(records: &[livetiming::TimingRecord]) {
    println!("{:>3}  {:<4} {:<4} {:>10} {:>10} {:>10}  {}", "POS", "CODE", "NO", "LAST", "LEADER", "AHEAD", "TYRES");
    for record in records {
        let tyres: String = record
            .tyre_history
            .iter()
            .map(|stint| stint.compound.chars().next().unwrap_or('?'))
            .collect();
        println!(
            "{:>3}  {:<4} {:<4} {:>10} {:>10} {:>10}  {}{}",
            record.position,
            record.driver_code,
            record.car_number,
            record.last_lap_time,
            record.gap_to_leader,
            record.gap_to_ahead,
            tyres,
            if record.is_pit { "  PIT" } else { "" },
        );
    }
    println!();
}
