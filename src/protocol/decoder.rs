//! Inbound frame decoding and state application.
//!
//! [`MessageDecoder`] turns raw socket frames into partial updates and folds
//! them into a [`LiveState`]. It also watches for a run of empty frames,
//! which is how a silently dead feed shows up.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use super::inflate::{inflate_or_empty, split_topic};
use super::merge::LiveState;
use super::message::{INITIAL_REQUEST_ID, InboundFrame};

// ============================================================================
// Constants
// ============================================================================

/// Consecutive empty frames tolerated before the state is reset.
pub const DEFAULT_STALE_FRAME_LIMIT: u32 = 5;

// ============================================================================
// FrameOutcome
// ============================================================================

/// What applying a frame did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Topics were merged into the state.
    Applied {
        /// Number of topic updates merged.
        topics: usize,
    },
    /// Empty keep-alive frame, state unchanged.
    Empty,
    /// Too many empty frames in a row, state was reset.
    StaleReset,
    /// Frame carried nothing to apply or could not be parsed.
    Ignored,
}

impl FrameOutcome {
    /// Returns `true` if subscribers should see a new snapshot.
    #[inline]
    #[must_use]
    pub fn changed_state(self) -> bool {
        matches!(self, Self::Applied { .. } | Self::StaleReset)
    }
}

// ============================================================================
// MessageDecoder
// ============================================================================

/// Decodes inbound frames and applies them to a [`LiveState`].
#[derive(Debug, Clone)]
pub struct MessageDecoder {
    request_id: u32,
    stale_limit: u32,
    empty_run: u32,
}

impl Default for MessageDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_FRAME_LIMIT)
    }
}

impl MessageDecoder {
    /// Creates a decoder that resets state after more than `stale_limit`
    /// consecutive empty frames.
    #[inline]
    #[must_use]
    pub fn new(stale_limit: u32) -> Self {
        Self {
            request_id: INITIAL_REQUEST_ID,
            stale_limit,
            empty_run: 0,
        }
    }

    /// Returns the current run of consecutive empty frames.
    #[inline]
    #[must_use]
    pub fn empty_run(&self) -> u32 {
        self.empty_run
    }

    /// Forgets the empty-frame run, used when the state is reset externally.
    #[inline]
    pub fn reset(&mut self) {
        self.empty_run = 0;
    }

    /// Decodes one raw frame and merges it into `state`.
    ///
    /// Never fails: unparseable frames are logged and ignored.
    pub fn apply(&mut self, text: &str, state: &mut LiveState) -> FrameOutcome {
        let frame = match InboundFrame::parse(text, self.request_id) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to parse inbound frame");
                return FrameOutcome::Ignored;
            }
        };

        if frame == InboundFrame::Empty {
            self.empty_run += 1;
            if self.empty_run > self.stale_limit {
                debug!(run = self.empty_run, "Feed looks stale, resetting state");
                state.clear();
                self.empty_run = 0;
                return FrameOutcome::StaleReset;
            }
            return FrameOutcome::Empty;
        }
        self.empty_run = 0;

        match frame {
            InboundFrame::Feed(updates) => {
                let topics = updates.len();
                for (topic, value) in updates {
                    let (name, value) = decode_topic(&topic, value);
                    trace!(topic = %name, "Applying feed update");
                    state.apply_topic(name, value);
                }
                if topics == 0 {
                    FrameOutcome::Ignored
                } else {
                    FrameOutcome::Applied { topics }
                }
            }

            InboundFrame::Snapshot(snapshot) => {
                let topics = snapshot.len();
                let partial: Map<String, Value> = snapshot
                    .into_iter()
                    .map(|(topic, value)| {
                        let (name, value) = decode_topic(&topic, value);
                        (name.to_string(), value)
                    })
                    .collect();
                debug!(topics, "Applying initial snapshot");
                state.apply(partial);
                FrameOutcome::Applied { topics }
            }

            InboundFrame::Empty | InboundFrame::Other => FrameOutcome::Ignored,
        }
    }
}

/// Strips the compressed suffix from a topic and inflates its value.
fn decode_topic(topic: &str, value: Value) -> (&str, Value) {
    match split_topic(topic) {
        (name, true) => (name, inflate_or_empty(&value)),
        (name, false) => (name, value),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::protocol::inflate::tests::compress;

    fn feed(topic: &str, value: Value) -> String {
        json!({"M": [{"H": "Streaming", "M": "feed", "A": [topic, value, "2024-01-01T00:00:00Z"]}]})
            .to_string()
    }

    #[test]
    fn test_feed_updates_merge() {
        let mut decoder = MessageDecoder::default();
        let mut state = LiveState::new();

        let first = decoder.apply(&feed("TimingData", json!({"Lines": {"1": {"Position": "1"}}})), &mut state);
        let second = decoder.apply(
            &feed("TimingData", json!({"Lines": {"1": {"NumberOfLaps": 4}}})),
            &mut state,
        );

        assert_eq!(first, FrameOutcome::Applied { topics: 1 });
        assert!(second.changed_state());
        assert_eq!(
            state.topic("TimingData"),
            Some(&json!({"Lines": {"1": {"Position": "1", "NumberOfLaps": 4}}}))
        );
    }

    #[test]
    fn test_compressed_topic_is_inflated_under_base_name() {
        let mut decoder = MessageDecoder::default();
        let mut state = LiveState::new();
        let payload = json!({"Position": [{"Entries": {"1": {"X": 1, "Y": 2, "Z": 3}}}]});

        decoder.apply(&feed("Position.z", json!(compress(&payload))), &mut state);

        assert_eq!(state.topic("Position"), Some(&payload));
        assert!(state.topic("Position.z").is_none());
    }

    #[test]
    fn test_corrupt_compressed_topic_becomes_empty_object() {
        let mut decoder = MessageDecoder::default();
        let mut state = LiveState::new();

        let outcome = decoder.apply(&feed("CarData.z", json!("%%%")), &mut state);

        assert_eq!(outcome, FrameOutcome::Applied { topics: 1 });
        assert_eq!(state.topic("CarData"), Some(&json!({})));
    }

    #[test]
    fn test_initial_snapshot() {
        let mut decoder = MessageDecoder::default();
        let mut state = LiveState::new();
        let position = json!({"Position": []});
        let text = json!({
            "R": {
                "DriverList": {"1": {"Tla": "VER"}},
                "Position.z": compress(&position),
            },
            "I": "1"
        })
        .to_string();

        let outcome = decoder.apply(&text, &mut state);

        assert_eq!(outcome, FrameOutcome::Applied { topics: 2 });
        assert_eq!(state.topic("DriverList"), Some(&json!({"1": {"Tla": "VER"}})));
        assert_eq!(state.topic("Position"), Some(&position));
    }

    #[test]
    fn test_stale_feed_resets_after_six_empty_frames() {
        let mut decoder = MessageDecoder::default();
        let mut state = LiveState::new();
        decoder.apply(&feed("LapCount", json!({"CurrentLap": 1})), &mut state);

        for _ in 0..5 {
            assert_eq!(decoder.apply("{}", &mut state), FrameOutcome::Empty);
        }
        assert!(!state.is_empty());

        assert_eq!(decoder.apply("{}", &mut state), FrameOutcome::StaleReset);
        assert!(state.is_empty());
        assert_eq!(decoder.empty_run(), 0);
    }

    #[test]
    fn test_non_empty_frame_breaks_empty_run() {
        let mut decoder = MessageDecoder::default();
        let mut state = LiveState::new();

        for _ in 0..5 {
            decoder.apply("{}", &mut state);
        }
        decoder.apply(r#"{"C":"d-1","M":[]}"#, &mut state);
        assert_eq!(decoder.empty_run(), 0);

        decoder.apply(&feed("LapCount", json!({"CurrentLap": 2})), &mut state);
        assert_eq!(decoder.apply("{}", &mut state), FrameOutcome::Empty);
        assert!(!state.is_empty());
    }

    #[test]
    fn test_garbage_frame_is_ignored() {
        let mut decoder = MessageDecoder::default();
        let mut state = LiveState::new();
        decoder.apply(&feed("LapCount", json!({"CurrentLap": 2})), &mut state);

        assert_eq!(decoder.apply("{\"M\": [", &mut state), FrameOutcome::Ignored);
        assert_eq!(state.topic("LapCount"), Some(&json!({"CurrentLap": 2})));
    }
}
