//! Compressed topic inflation.
//!
//! Topics whose name ends in [`COMPRESSED_SUFFIX`] carry a base64 string of
//! raw-deflate compressed UTF-8 JSON instead of a JSON value.

// ============================================================================
// Imports
// ============================================================================

use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::DeflateDecoder;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Topic name suffix marking a compressed payload.
pub const COMPRESSED_SUFFIX: &str = ".z";

// ============================================================================
// Topic Names
// ============================================================================

/// Splits a topic name into its stored name and whether it is compressed.
///
/// `"Position.z"` becomes `("Position", true)`.
#[inline]
#[must_use]
pub fn split_topic(name: &str) -> (&str, bool) {
    match name.strip_suffix(COMPRESSED_SUFFIX) {
        Some(base) => (base, true),
        None => (name, false),
    }
}

// ============================================================================
// Inflation
// ============================================================================

/// Decodes base64, raw-inflates and parses the payload as JSON.
///
/// # Errors
///
/// - [`Error::Base64`] if the payload is not valid base64
/// - [`Error::Io`] if the deflate stream is corrupt or not UTF-8
/// - [`Error::Json`] if the inflated text is not JSON
pub fn try_inflate(encoded: &str) -> Result<Value> {
    let compressed = STANDARD.decode(encoded.trim())?;
    let mut text = String::new();
    DeflateDecoder::new(compressed.as_slice()).read_to_string(&mut text)?;
    Ok(serde_json::from_str(&text)?)
}

/// Inflates a compressed topic value, substituting an empty object on failure.
///
/// Non-string values cannot be compressed payloads and are rejected the same
/// way.
#[must_use]
pub fn inflate_or_empty(value: &Value) -> Value {
    let result = match value {
        Value::String(encoded) => try_inflate(encoded),
        other => Err(Error::decode(format!(
            "compressed payload is not a string: {other}"
        ))),
    };

    result.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to inflate compressed payload");
        Value::Object(Map::new())
    })
}

// ============================================================================
// Tests
// ============================================================================
