//! Polled stream parsing.
//!
//! Raw `.jsonStream` text is split into timestamped blocks and turned into
//! per-car partial updates, or scanned for the latest position snapshot.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `parser` | Block splitting with malformed-block recovery |
//! | `position` | Position samples and latest-snapshot extraction |

/// Timestamp-delimited block parsing.
pub mod parser;

/// Car position snapshots.
pub mod position;

pub use parser::{
    Block, LineUpdate, StreamBlock, StreamBlocks, first_balanced_object, line_updates, lines_of,
    parse_blocks,
};
pub use position::{PositionSample, latest_position_snapshot, samples_from_snapshot};
