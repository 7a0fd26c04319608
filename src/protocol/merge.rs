//! Live state mapping and deep-merge of partial updates.
//!
//! Every topic of the feed publishes fragments of its full value. A fragment
//! is folded into the stored value key by key: nested objects are merged
//! recursively, everything else (scalars, arrays, empty objects) overwrites.
//!
//! Payloads are kept as [`serde_json::Value`], which already is the tagged
//! `object | array | scalar` variant the merge walks over.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Map, Value};

// ============================================================================
// Deep Merge
// ============================================================================

/// Merges `partial` into `target` in place.
///
/// Keys of `target` absent from `partial` are left untouched.
pub fn deep_merge(target: &mut Map<String, Value>, partial: Map<String, Value>) {
    for (key, incoming) in partial {
        match incoming {
            Value::Object(incoming) if !incoming.is_empty() => match target.get_mut(&key) {
                Some(Value::Object(existing)) => deep_merge(existing, incoming),
                _ => {
                    target.insert(key, Value::Object(incoming));
                }
            },
            other => {
                target.insert(key, other);
            }
        }
    }
}

/// Pure form of [`deep_merge`]: returns the merged value, leaving both
/// inputs untouched.
#[must_use]
pub fn merged(original: &Map<String, Value>, partial: &Map<String, Value>) -> Map<String, Value> {
    let mut copy = original.clone();
    deep_merge(&mut copy, partial.clone());
    copy
}

// ============================================================================
// LiveState
// ============================================================================

/// Mapping from topic name to its current, fully merged value.
///
/// Owned by the ingestion path that produces it; consumers receive
/// immutable snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LiveState {
    topics: Map<String, Value>,
}

impl LiveState {
    /// Creates an empty state.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a single-topic partial update.
    pub fn apply_topic(&mut self, topic: impl Into<String>, value: Value) {
        let mut partial = Map::new();
        partial.insert(topic.into(), value);
        deep_merge(&mut self.topics, partial);
    }

    /// Applies a multi-topic partial update.
    pub fn apply(&mut self, partial: Map<String, Value>) {
        deep_merge(&mut self.topics, partial);
    }

    /// Returns the current value of a topic.
    #[inline]
    #[must_use]
    pub fn topic(&self, name: &str) -> Option<&Value> {
        self.topics.get(name)
    }

    /// Returns the names of all known topics.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    /// Returns the number of known topics.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Returns `true` if no topic has been received yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Drops every topic.
    #[inline]
    pub fn clear(&mut self) {
        self.topics.clear();
    }

    /// Returns the underlying mapping.
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.topics
    }
}

impl From<Map<String, Value>> for LiveState {
    fn from(topics: Map<String, Value>) -> Self {
        Self { topics }
    }
}

// ============================================================================
// Tests
// ============================================================================
