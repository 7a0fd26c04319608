//! Hub message types.
//!
//! Defines the handshake response, the outbound subscribe invocation and the
//! inbound frame shapes of the streaming hub.
//!
//! # Inbound Formats
//!
//! Feed message (one or more topic updates):
//! ```json
//! { "C": "d-1,2", "M": [ { "H": "Streaming", "M": "feed", "A": ["TimingData", { ... }, "2024-..."] } ] }
//! ```
//!
//! Initial snapshot (reply to the subscribe invocation):
//! ```json
//! { "R": { "TimingData": { ... }, "DriverList": { ... } }, "I": "1" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, from_value};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Hub serving the timing topics.
pub const DEFAULT_HUB: &str = "Streaming";

/// Topics subscribed on every connection.
pub const DEFAULT_TOPICS: [&str; 15] = [
    "Heartbeat",
    "CarData.z",
    "Position.z",
    "ExtrapolatedClock",
    "TimingStats",
    "TimingAppData",
    "WeatherData",
    "TrackStatus",
    "DriverList",
    "RaceControlMessages",
    "SessionInfo",
    "SessionData",
    "LapCount",
    "TimingData",
    "TeamRadio",
];

/// Hub method name carrying topic updates.
pub const FEED_METHOD: &str = "feed";

/// Hub method name of the subscribe invocation.
pub const SUBSCRIBE_METHOD: &str = "Subscribe";

/// Invocation id of the subscribe request.
///
/// The initial snapshot reply carries the same id.
pub const INITIAL_REQUEST_ID: u32 = 1;

// ============================================================================
// NegotiateResponse
// ============================================================================

/// Body of the HTTP negotiation response.
#[derive(Debug, Clone, Deserialize)]
pub struct NegotiateResponse {
    /// Token required to open the socket.
    #[serde(rename = "ConnectionToken", default)]
    pub connection_token: Option<String>,
}

impl NegotiateResponse {
    /// Returns the token if present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Negotiation`] when the response carries no token.
    pub fn into_token(self) -> Result<String> {
        self.connection_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::negotiation("response carries no ConnectionToken"))
    }
}

// ============================================================================
// SubscribeRequest
// ============================================================================

/// Outbound subscribe invocation.
///
/// # Format
///
/// ```json
/// { "H": "Streaming", "M": "Subscribe", "A": [["Heartbeat", "TimingData"]], "I": 1 }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeRequest {
    /// Hub name.
    #[serde(rename = "H")]
    pub hub: String,

    /// Method name (always `Subscribe`).
    #[serde(rename = "M")]
    pub method: &'static str,

    /// Arguments: a single list of topic names.
    #[serde(rename = "A")]
    pub args: [Vec<String>; 1],

    /// Invocation id.
    #[serde(rename = "I")]
    pub id: u32,
}

impl SubscribeRequest {
    /// Creates a subscribe invocation for the given topics.
    #[must_use]
    pub fn new(hub: impl Into<String>, topics: &[String]) -> Self {
        Self {
            hub: hub.into(),
            method: SUBSCRIBE_METHOD,
            args: [topics.to_vec()],
            id: INITIAL_REQUEST_ID,
        }
    }
}

// ============================================================================
// Inbound Frames
// ============================================================================

/// One hub invocation inside a feed message.
#[derive(Debug, Clone, Deserialize)]
struct HubInvocation {
    #[serde(rename = "M", default)]
    method: String,
    #[serde(rename = "A", default)]
    args: Vec<Value>,
}

/// Classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Frame decoded to an empty object (keep-alive).
    Empty,

    /// Topic updates in arrival order, topic names as sent.
    Feed(Vec<(String, Value)>),

    /// Initial snapshot keyed by topic name.
    Snapshot(Map<String, Value>),

    /// Any other well-formed frame (acknowledgements, group tokens).
    Other,
}

impl InboundFrame {
    /// Parses and classifies one raw text frame.
    ///
    /// `request_id` is the invocation id whose reply is the initial snapshot.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the frame is not JSON
    /// - [`Error::Protocol`] if the frame is JSON but not an object
    pub fn parse(text: &str, request_id: u32) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut frame) = value else {
            return Err(Error::protocol("frame is not an object"));
        };

        if frame.is_empty() {
            return Ok(Self::Empty);
        }

        if let Some(Value::Array(invocations)) = frame.remove("M") {
            let updates = invocations
                .into_iter()
                .filter_map(|raw| from_value::<HubInvocation>(raw).ok())
                .filter(|invocation| invocation.method == FEED_METHOD)
                .filter_map(|invocation| {
                    let mut args = invocation.args.into_iter();
                    let topic = args.next()?.as_str()?.to_string();
                    let value = args.next().unwrap_or(Value::Null);
                    Some((topic, value))
                })
                .collect();
            return Ok(Self::Feed(updates));
        }

        let replies_to_request = frame.get("I").is_some_and(|id| match id {
            Value::String(s) => s.parse::<u32>().ok() == Some(request_id),
            Value::Number(n) => n.as_u64() == Some(u64::from(request_id)),
            _ => false,
        });

        if replies_to_request
            && let Some(Value::Object(snapshot)) = frame.remove("R")
            && !snapshot.is_empty()
        {
            return Ok(Self::Snapshot(snapshot));
        }

        Ok(Self::Other)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_subscribe_serialization() {
        let topics = vec!["Heartbeat".to_string(), "TimingData".to_string()];
        let request = SubscribeRequest::new("Streaming", &topics);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"H": "Streaming", "M": "Subscribe", "A": [["Heartbeat", "TimingData"]], "I": 1})
        );
    }

    #[test]
    fn test_negotiate_token() {
        let response: NegotiateResponse =
            serde_json::from_str(r#"{"Url":"/signalr","ConnectionToken":"abc+/=","ProtocolVersion":"1.5"}"#)
                .unwrap();
        assert_eq!(response.into_token().unwrap(), "abc+/=");

        let missing: NegotiateResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(missing.into_token(), Err(Error::Negotiation { .. })));
    }

    #[test]
    fn test_parse_empty_frame() {
        assert_eq!(InboundFrame::parse("{}", 1).unwrap(), InboundFrame::Empty);
    }

    #[test]
    fn test_parse_feed_frame() {
        let text = r#"{"C":"d-1","M":[
            {"H":"Streaming","M":"feed","A":["TrackStatus",{"Status":"1"},"2024-05-01T12:00:00Z"]},
            {"H":"Streaming","M":"other","A":["Ignored",{}]},
            {"H":"Streaming","M":"feed","A":["Position.z","abc"]}
        ]}"#;

        let InboundFrame::Feed(updates) = InboundFrame::parse(text, 1).unwrap() else {
            panic!("expected feed frame");
        };
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0], ("TrackStatus".to_string(), json!({"Status": "1"})));
        assert_eq!(updates[1].0, "Position.z");
    }

    #[test]
    fn test_parse_snapshot_frame() {
        let text = r#"{"R":{"LapCount":{"CurrentLap":3}},"I":"1"}"#;
        let InboundFrame::Snapshot(snapshot) = InboundFrame::parse(text, 1).unwrap() else {
            panic!("expected snapshot frame");
        };
        assert_eq!(snapshot["LapCount"]["CurrentLap"], 3);
    }

    #[test]
    fn test_reply_to_other_request_is_not_snapshot() {
        let text = r#"{"R":{"LapCount":{}},"I":"7"}"#;
        assert_eq!(InboundFrame::parse(text, 1).unwrap(), InboundFrame::Other);
    }

    #[test]
    fn test_parse_invalid_frames() {
        assert!(InboundFrame::parse("not json", 1).is_err());
        assert!(matches!(
            InboundFrame::parse("[1,2]", 1),
            Err(Error::Protocol { .. })
        ));
    }
}
