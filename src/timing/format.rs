//! Raw field unwrapping and presentation formatting.
//!
//! Timing fields show up either bare (`"GapToLeader": "+1.2"`) or wrapped
//! (`"IntervalToPositionAhead": {"Value": "+0.4", "Catching": false}`).
//! [`RawField`] is the one place that difference is dealt with.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Gap shown for the car in the lead.
pub const LEADER: &str = "Leader";

/// Placeholder gap the feed sends before timing starts.
pub const GAP: &str = "Gap";

// ============================================================================
// RawField
// ============================================================================

/// A feed field that is either a bare scalar or a `{"Value": ..}` wrapper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawField<'a> {
    /// Bare value.
    Scalar(&'a Value),
    /// Object carrying a `Value` key, plus flags alongside it.
    Wrapped {
        /// The wrapped value.
        value: &'a Value,
        /// The whole wrapper, for flag lookups.
        wrapper: &'a Value,
    },
}

impl<'a> RawField<'a> {
    /// Classifies a raw value.
    #[must_use]
    pub fn of(raw: &'a Value) -> Self {
        match raw.get("Value") {
            Some(value) if raw.is_object() => Self::Wrapped {
                value,
                wrapper: raw,
            },
            _ => Self::Scalar(raw),
        }
    }

    /// Returns the inner value.
    #[inline]
    #[must_use]
    pub fn value(self) -> &'a Value {
        match self {
            Self::Scalar(value) | Self::Wrapped { value, .. } => value,
        }
    }

    /// Returns `true` if the wrapper or the scalar object carries `flag: true`.
    #[must_use]
    pub fn flag(self, flag: &str) -> bool {
        let holder = match self {
            Self::Scalar(value) => value,
            Self::Wrapped { wrapper, .. } => wrapper,
        };
        holder.get(flag).and_then(Value::as_bool).unwrap_or(false)
    }
}

// ============================================================================
// Lap Times
// ============================================================================

/// Renders milliseconds as `m:ss.mmm`.
#[must_use]
pub fn format_millis(millis: u64) -> String {
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) / 1_000;
    let fraction = millis % 1_000;
    format!("{minutes}:{seconds:02}.{fraction:03}")
}

/// Formats a lap-time field.
///
/// Numbers are milliseconds; strings pass through unchanged. Anything else
/// is not a lap time.
#[must_use]
pub fn format_lap_time(raw: &Value) -> Option<String> {
    match RawField::of(raw).value() {
        Value::Number(n) => {
            let millis = n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0).round() as u64))?;
            Some(format_millis(millis))
        }
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

// ============================================================================
// Gaps
// ============================================================================

/// Formats a gap or interval field.
///
/// - `0` becomes `Leader`, other non-negative numbers `+<n.nnn>`
/// - positive numeric strings gain a `+` prefix
/// - `+`-prefixed strings, `Gap`, `Leader`, empty and lap counts (`1L`)
///   pass through verbatim
#[must_use]
pub fn format_gap(raw: &Value) -> Option<String> {
    match RawField::of(raw).value() {
        Value::Number(n) => {
            let gap = n.as_f64()?;
            Some(if gap == 0.0 {
                LEADER.to_string()
            } else if gap > 0.0 {
                format!("+{gap:.3}")
            } else {
                format!("{gap:.3}")
            })
        }
        Value::String(s) => Some(format_gap_text(s)),
        _ => None,
    }
}

fn format_gap_text(text: &str) -> String {
    if text.is_empty() || text.starts_with('+') || text == GAP || text == LEADER {
        return text.to_string();
    }

    match text.parse::<f64>() {
        Ok(gap) if gap > 0.0 => format!("+{text}"),
        _ => text.to_string(),
    }
}

// ============================================================================
// Scalars
// ============================================================================

/// Reads a non-negative integer from a number or numeric string.
#[must_use]
pub fn as_count(raw: &Value) -> Option<u32> {
    match RawField::of(raw).value() {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a non-empty string field.
#[must_use]
pub fn as_text(raw: &Value) -> Option<&str> {
    raw.as_str().filter(|s| !s.is_empty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_raw_field_unwrap() {
        let wrapped = json!({"Value": "+0.512", "Catching": true});
        assert_eq!(RawField::of(&wrapped).value(), &json!("+0.512"));
        assert!(RawField::of(&wrapped).flag("Catching"));

        let bare = json!("1:30.000");
        assert_eq!(RawField::of(&bare), RawField::Scalar(&bare));
        assert!(!RawField::of(&bare).flag("Catching"));
    }

    #[test]
    fn test_gap_formatting() {
        assert_eq!(format_gap(&json!(0)).as_deref(), Some("Leader"));
        assert_eq!(format_gap(&json!(1.234)).as_deref(), Some("+1.234"));
        assert_eq!(format_gap(&json!(12)).as_deref(), Some("+12.000"));
        assert_eq!(format_gap(&json!("+0.512")).as_deref(), Some("+0.512"));
        assert_eq!(format_gap(&json!("0.512")).as_deref(), Some("+0.512"));
        assert_eq!(format_gap(&json!("Gap")).as_deref(), Some("Gap"));
        assert_eq!(format_gap(&json!("Leader")).as_deref(), Some("Leader"));
        assert_eq!(format_gap(&json!("")).as_deref(), Some(""));
        assert_eq!(format_gap(&json!("1L")).as_deref(), Some("1L"));
        assert_eq!(format_gap(&json!({"Value": "3.2"})).as_deref(), Some("+3.2"));
        assert_eq!(format_gap(&json!(null)), None);
    }

    #[test]
    fn test_lap_time_formatting() {
        assert_eq!(format_lap_time(&json!(83_456)).as_deref(), Some("1:23.456"));
        assert_eq!(format_lap_time(&json!(59_001)).as_deref(), Some("0:59.001"));
        assert_eq!(
            format_lap_time(&json!({"Value": "1:31.207", "PersonalFastest": true})).as_deref(),
            Some("1:31.207")
        );
        assert_eq!(format_lap_time(&json!({"Value": ""})).as_deref(), Some(""));
        assert_eq!(format_lap_time(&json!(true)), None);
    }

    #[test]
    fn test_counts() {
        assert_eq!(as_count(&json!(12)), Some(12));
        assert_eq!(as_count(&json!("7")), Some(7));
        assert_eq!(as_count(&json!("")), None);
        assert_eq!(as_count(&json!(-1)), None);
    }
}
