//! Type-safe identifiers for drivers and cars.
//!
//! The feed joins per-car timing lines against the roster by two keys:
//! the racing number (`"44"`) and the three-letter short code (`"HAM"`).
//! Both are plain strings on the wire, so they are wrapped in newtypes to
//! keep the joins honest at compile time.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// CarNumber
// ============================================================================

/// Racing number of a car, as the feed keys it (`"1"`, `"44"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarNumber(String);

impl CarNumber {
    /// Creates a car number from its string form.
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the string form.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CarNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CarNumber {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for CarNumber {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// DriverCode
// ============================================================================

/// Three-letter driver abbreviation (`"VER"`).
///
/// When the roster does not know a car, the racing number doubles as the
/// code, see [`DriverCode::from_car_number`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverCode(String);

impl DriverCode {
    /// Creates a driver code from its string form.
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Falls back to the racing number as the code.
    #[inline]
    #[must_use]
    pub fn from_car_number(number: &CarNumber) -> Self {
        Self(number.as_str().to_string())
    }

    /// Returns the string form.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interprets the code as a racing number when it is purely numeric.
    #[must_use]
    pub fn as_car_number(&self) -> Option<CarNumber> {
        let numeric = !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit());
        numeric.then(|| CarNumber::new(self.0.clone()))
    }
}

impl fmt::Display for DriverCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DriverCode {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for DriverCode {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Tests
// ============================================================================
