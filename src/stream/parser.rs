//! Timestamp-delimited stream parsing.
//!
//! Static `.jsonStream` files are a concatenation of `<timestamp><json>`
//! pairs, one per line on a good day. Fetches taken while the file is being
//! written end in a truncated block, and some blocks arrive glued together.
//! Parsing therefore never aborts: each block is parsed directly, then by
//! extracting its first balanced `{...}` span, and dropped if both fail.
//!
//! # Format
//!
//! ```text
//! 00:00:01.000{"Lines":{"1":{"Position":"1"}}}
//! 00:00:02.000{"Lines":{"1":{"Position":"2"}}}
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::{Match, Matches, Regex};
use serde_json::{Map, Value};
use tracing::debug;

use crate::identifiers::CarNumber;

// ============================================================================
// Constants
// ============================================================================

/// Block timestamp: `H:MM:SS.mmm` or `HH:MM:SS.mmm`.
pub(crate) static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,2}:\d{2}:\d{2}\.\d{3}").expect("timestamp pattern is valid")
});

// ============================================================================
// Block
// ============================================================================

/// Parse result of one block body.
#[derive(Debug, Clone, PartialEq)]
pub enum Block<'a> {
    /// Block parsed, possibly after recovery.
    Parsed(Value),
    /// Block could not be recovered; carries the raw span.
    Malformed(&'a str),
}

impl<'a> Block<'a> {
    /// Parses a block body, falling back to its first balanced object span.
    #[must_use]
    pub fn parse(segment: &'a str) -> Self {
        let trimmed = segment.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');

        if let Ok(value) = serde_json::from_str(trimmed) {
            return Self::Parsed(value);
        }

        match first_balanced_object(trimmed).map(serde_json::from_str::<Value>) {
            Some(Ok(value)) => Self::Parsed(value),
            _ => Self::Malformed(trimmed),
        }
    }
}

/// Returns the first `{...}` span whose braces balance, ignoring braces
/// inside JSON strings.
#[must_use]
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().copied().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

// ============================================================================
// StreamBlock
// ============================================================================

/// One `<timestamp><json>` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamBlock<'a> {
    /// Session-relative timestamp as written in the stream.
    pub timestamp: &'a str,
    /// Parsed body.
    pub body: Block<'a>,
}

/// Lazy iterator over the blocks of a raw stream.
///
/// Processes exactly one snapshot of the text; create a new iterator for a
/// new fetch.
pub struct StreamBlocks<'a> {
    raw: &'a str,
    timestamps: Matches<'static, 'a>,
    current: Option<Match<'a>>,
}

impl<'a> StreamBlocks<'a> {
    /// Creates a block iterator over `raw`.
    #[must_use]
    pub fn new(raw: &'a str) -> Self {
        let mut blocks = Self {
            raw,
            timestamps: TIMESTAMP.find_iter(raw),
            current: None,
        };
        blocks.current = blocks.next_timestamp();
        blocks
    }

    /// Finds the next timestamp that actually opens a block.
    ///
    /// Timestamps embedded in values (`"2024-05-01T12:00:00.000Z"`,
    /// `"1:02:03.456"`) are not followed by an object and are skipped.
    fn next_timestamp(&mut self) -> Option<Match<'a>> {
        let raw = self.raw;
        self.timestamps
            .by_ref()
            .find(|m| raw[m.end()..].trim_start().starts_with('{'))
    }
}

impl<'a> Iterator for StreamBlocks<'a> {
    type Item = StreamBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        let next = self.next_timestamp();
        let end = next.map_or(self.raw.len(), |m| m.start());
        self.current = next;

        let body = Block::parse(&self.raw[current.end()..end]);
        if let Block::Malformed(span) = &body {
            debug!(
                timestamp = current.as_str(),
                len = span.len(),
                "Dropping malformed stream block"
            );
        }

        Some(StreamBlock {
            timestamp: current.as_str(),
            body,
        })
    }
}

/// Splits a raw stream into its blocks.
#[inline]
#[must_use]
pub fn parse_blocks(raw: &str) -> StreamBlocks<'_> {
    StreamBlocks::new(raw)
}

// ============================================================================
// LineUpdate
// ============================================================================

/// Partial update of a single car taken from a block's `Lines` map.
#[derive(Debug, Clone, PartialEq)]
pub struct LineUpdate {
    /// Timestamp of the block the update came from.
    pub timestamp: String,
    /// Car the update belongs to.
    pub car_number: CarNumber,
    /// Raw fields of the update.
    pub fields: Map<String, Value>,
}

impl LineUpdate {
    /// Creates an update from raw parts.
    #[must_use]
    pub fn new(
        timestamp: impl Into<String>,
        car_number: CarNumber,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            car_number,
            fields,
        }
    }

    /// Returns a raw field.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Extracts the per-car updates of a `Lines` map, in map order.
pub fn lines_of<'v>(
    timestamp: &'v str,
    value: &'v Value,
) -> impl Iterator<Item = LineUpdate> + 'v {
    value
        .get("Lines")
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter_map(move |(number, fields)| {
            let fields = fields.as_object()?;
            Some(LineUpdate::new(
                timestamp,
                CarNumber::new(number.as_str()),
                fields.clone(),
            ))
        })
}

/// Parses a raw timing stream into ordered per-car updates.
///
/// Malformed blocks are skipped; blocks without a `Lines` map yield nothing.
pub fn line_updates(raw: &str) -> impl Iterator<Item = LineUpdate> + '_ {
    parse_blocks(raw).flat_map(|block| match block.body {
        Block::Parsed(value) => lines_of(block.timestamp, &value).collect::<Vec<_>>(),
        Block::Malformed(_) => Vec::new(),
    })
}

// ============================================================================
// Tests
// ============================================================================
