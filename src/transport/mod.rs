//! Push-path transport.
//!
//! This module handles the handshake with the streaming hub and the
//! persistent socket that carries the live feed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   GET negotiate    ┌─────────────────┐
//! │  LiveConnection  │───────────────────►│                 │
//! │                  │◄── token, cookie ──│  Streaming hub  │
//! │  reader task     │                    │                 │
//! │  → decoder loop  │◄══════ socket ════►│                 │
//! └──────────────────┘                    └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `HubEndpoint::negotiate` - Exchange hub name for a connection token
//! 2. Open the socket at `HubEndpoint::socket_url`
//! 3. Send the subscribe invocation for the configured topics
//! 4. Decode frames into the live state until the socket fails
//! 5. Clear the state, wait the reconnect delay, go to 1
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Socket lifecycle and event loop |
//! | `negotiate` | HTTP handshake and URL building |

// ============================================================================
// Submodules
// ============================================================================

/// Socket lifecycle and event loop.
pub mod connection;

/// Hub handshake.
pub mod negotiate;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{
    ConnectionConfig, ConnectionStatus, DEFAULT_CHANNEL_CAPACITY, DEFAULT_RECONNECT_DELAY,
    LiveConnection, Snapshot,
};
pub use negotiate::{
    DEFAULT_CLIENT_PROTOCOL, DEFAULT_CONNECT_PATH, DEFAULT_NEGOTIATE_PATH, HubEndpoint, Negotiated,
};
