//! Streaming hub protocol and message decoding.
//!
//! This module defines the wire format of the push feed and the decoder that
//! folds inbound frames into the shared [`LiveState`].
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `NegotiateResponse` | Server → Client | Connection token from the HTTP handshake |
//! | `SubscribeRequest` | Client → Server | Topic subscription, invocation id `1` |
//! | Snapshot (`R`, `I`) | Server → Client | Initial value of every subscribed topic |
//! | Feed (`M`) | Server → Client | Partial topic updates |
//!
//! # Compressed Topics
//!
//! Topics suffixed `.z` carry `base64(raw-deflate(json))`. They are inflated
//! on arrival and stored under the name without the suffix.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `decoder` | Frame decoding and stale-feed detection |
//! | `inflate` | Compressed payload inflation |
//! | `merge` | Deep merge and the [`LiveState`] mapping |
//! | `message` | Handshake and hub message types |

// ============================================================================
// Submodules
// ============================================================================

/// Frame decoding and state application.
pub mod decoder;

/// Compressed topic inflation.
pub mod inflate;

/// Deep merge of partial updates.
pub mod merge;

/// Handshake and hub message types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use decoder::{DEFAULT_STALE_FRAME_LIMIT, FrameOutcome, MessageDecoder};
pub use inflate::{COMPRESSED_SUFFIX, inflate_or_empty, split_topic, try_inflate};
pub use merge::{LiveState, deep_merge, merged};
pub use message::{DEFAULT_HUB, DEFAULT_TOPICS, InboundFrame, NegotiateResponse, SubscribeRequest};
