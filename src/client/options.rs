//! Feed client configuration.
//!
//! Every tunable of both ingestion paths, with defaults matching the public
//! timing service.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use livetiming::FeedOptions;
//!
//! let options = FeedOptions::new()
//!     .with_reconnect_delay(Duration::from_secs(5))
//!     .with_topics(["TimingData", "DriverList"]);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::Result;
use crate::polling::PollIntervals;
use crate::protocol::{DEFAULT_HUB, DEFAULT_STALE_FRAME_LIMIT, DEFAULT_TOPICS};
use crate::transport::{
    ConnectionConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_CLIENT_PROTOCOL, DEFAULT_CONNECT_PATH,
    DEFAULT_NEGOTIATE_PATH, DEFAULT_RECONNECT_DELAY, HubEndpoint,
};

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the live hub.
pub const DEFAULT_LIVE_BASE_URL: &str = "https://livetiming.formula1.com";

/// Base URL of the static archive.
pub const DEFAULT_STATIC_BASE_URL: &str = "https://livetiming.formula1.com/static";

/// Base URL of the circuit geometry dataset.
pub const DEFAULT_GEOMETRY_BASE_URL: &str = "https://api.multiviewer.app/api/v1/circuits";

/// Timing and position poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Tyre stint refresh interval.
pub const DEFAULT_TYRE_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

// ============================================================================
// FeedOptions
// ============================================================================

/// Configuration of a [`super::FeedClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOptions {
    /// Live hub base URL; its scheme selects `ws` or `wss`.
    pub live_base_url: String,

    /// Static archive base URL.
    pub static_base_url: String,

    /// Circuit geometry base URL.
    pub geometry_base_url: String,

    /// Hub name.
    pub hub: String,

    /// Topics subscribed on connect.
    pub topics: Vec<String>,

    /// Negotiation path under the live base URL.
    pub negotiate_path: String,

    /// Socket path under the live base URL.
    pub connect_path: String,

    /// Hub client protocol version.
    pub client_protocol: String,

    /// Fixed delay between reconnect attempts.
    pub reconnect_delay: Duration,

    /// Consecutive empty frames tolerated before the state is reset.
    pub stale_frame_limit: u32,

    /// Capacity of the inbound frame channel.
    pub channel_capacity: usize,

    /// Timing and position poll interval.
    pub poll_interval: Duration,

    /// Tyre stint refresh interval.
    pub tyre_refresh_interval: Duration,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl FeedOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            live_base_url: DEFAULT_LIVE_BASE_URL.to_string(),
            static_base_url: DEFAULT_STATIC_BASE_URL.to_string(),
            geometry_base_url: DEFAULT_GEOMETRY_BASE_URL.to_string(),
            hub: DEFAULT_HUB.to_string(),
            topics: DEFAULT_TOPICS.iter().map(ToString::to_string).collect(),
            negotiate_path: DEFAULT_NEGOTIATE_PATH.to_string(),
            connect_path: DEFAULT_CONNECT_PATH.to_string(),
            client_protocol: DEFAULT_CLIENT_PROTOCOL.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            stale_frame_limit: DEFAULT_STALE_FRAME_LIMIT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            tyre_refresh_interval: DEFAULT_TYRE_REFRESH_INTERVAL,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl FeedOptions {
    /// Sets the live hub base URL.
    #[inline]
    #[must_use]
    pub fn with_live_base_url(mut self, url: impl Into<String>) -> Self {
        self.live_base_url = url.into();
        self
    }

    /// Sets the static archive base URL.
    #[inline]
    #[must_use]
    pub fn with_static_base_url(mut self, url: impl Into<String>) -> Self {
        self.static_base_url = url.into();
        self
    }

    /// Sets the circuit geometry base URL.
    #[inline]
    #[must_use]
    pub fn with_geometry_base_url(mut self, url: impl Into<String>) -> Self {
        self.geometry_base_url = url.into();
        self
    }

    /// Sets the hub name.
    #[inline]
    #[must_use]
    pub fn with_hub(mut self, hub: impl Into<String>) -> Self {
        self.hub = hub.into();
        self
    }

    /// Replaces the subscribed topics.
    #[must_use]
    pub fn with_topics(mut self, topics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the reconnect delay.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the stale-frame limit.
    #[inline]
    #[must_use]
    pub fn with_stale_frame_limit(mut self, limit: u32) -> Self {
        self.stale_frame_limit = limit;
        self
    }

    /// Sets the poll interval.
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the tyre refresh interval.
    #[inline]
    #[must_use]
    pub fn with_tyre_refresh_interval(mut self, interval: Duration) -> Self {
        self.tyre_refresh_interval = interval;
        self
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl FeedOptions {
    /// Builds the live connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the live base URL is invalid.
    pub fn connection_config(&self) -> Result<ConnectionConfig> {
        let endpoint = HubEndpoint::new(&self.live_base_url)?
            .with_hub(self.hub.as_str())
            .with_paths(self.negotiate_path.as_str(), self.connect_path.as_str())
            .with_client_protocol(self.client_protocol.as_str());

        Ok(ConnectionConfig {
            endpoint,
            topics: self.topics.clone(),
            reconnect_delay: self.reconnect_delay,
            stale_frame_limit: self.stale_frame_limit,
            channel_capacity: self.channel_capacity,
        })
    }

    /// Returns the polling cadence.
    #[inline]
    #[must_use]
    pub fn poll_intervals(&self) -> PollIntervals {
        PollIntervals {
            poll: self.poll_interval,
            tyre_refresh: self.tyre_refresh_interval,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
