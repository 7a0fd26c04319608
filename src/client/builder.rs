//! Builder pattern for feed client configuration.
//!
//! Provides a fluent API for configuring and creating [`FeedClient`]
//! instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use livetiming::FeedClient;
//!
//! # fn example() -> livetiming::Result<()> {
//! let client = FeedClient::builder()
//!     .reconnect_delay(Duration::from_secs(10))
//!     .poll_interval(Duration::from_secs(1))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

use super::core::FeedClient;
use super::options::FeedOptions;

// ============================================================================
// FeedClientBuilder
// ============================================================================

/// Builder for configuring a [`FeedClient`] instance.
///
/// Use [`FeedClient::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct FeedClientBuilder {
    /// Options being built.
    options: FeedOptions,
    /// HTTP client shared by every request.
    http: Option<reqwest::Client>,
}

// ============================================================================
// FeedClientBuilder Implementation
// ============================================================================

impl FeedClientBuilder {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: FeedOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the live hub base URL.
    #[inline]
    #[must_use]
    pub fn live_base_url(mut self, url: impl Into<String>) -> Self {
        self.options.live_base_url = url.into();
        self
    }

    /// Sets the static archive base URL.
    #[inline]
    #[must_use]
    pub fn static_base_url(mut self, url: impl Into<String>) -> Self {
        self.options.static_base_url = url.into();
        self
    }

    /// Sets the circuit geometry base URL.
    #[inline]
    #[must_use]
    pub fn geometry_base_url(mut self, url: impl Into<String>) -> Self {
        self.options.geometry_base_url = url.into();
        self
    }

    /// Replaces the subscribed topics.
    #[inline]
    #[must_use]
    pub fn topics(mut self, topics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options = self.options.with_topics(topics);
        self
    }

    /// Sets the reconnect delay.
    #[inline]
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.options.reconnect_delay = delay;
        self
    }

    /// Sets the poll interval.
    #[inline]
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Sets the tyre refresh interval.
    #[inline]
    #[must_use]
    pub fn tyre_refresh_interval(mut self, interval: Duration) -> Self {
        self.options.tyre_refresh_interval = interval;
        self
    }

    /// Uses an existing HTTP client.
    #[inline]
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a base URL is invalid
    /// - [`Error::Config`] if an interval is zero
    /// - [`Error::Config`] if the hub name or topic list is empty
    pub fn build(self) -> Result<FeedClient> {
        self.validate_urls()?;
        self.validate_intervals()?;
        self.validate_subscription()?;

        let http = self.http.unwrap_or_default();
        FeedClient::new(self.options, http)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl FeedClientBuilder {
    /// Validates the base URLs.
    fn validate_urls(&self) -> Result<()> {
        for (name, value) in [
            ("static", &self.options.static_base_url),
            ("geometry", &self.options.geometry_base_url),
        ] {
            let url = Url::parse(value)
                .map_err(|e| Error::config(format!("Invalid {name} base URL '{value}': {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::config(format!(
                    "The {name} base URL must use http or https, got '{value}'"
                )));
            }
        }

        // The live URL also accepts ws/wss.
        self.options.connection_config()?;
        Ok(())
    }

    /// Validates that no interval is zero.
    fn validate_intervals(&self) -> Result<()> {
        for (name, value) in [
            ("reconnect delay", self.options.reconnect_delay),
            ("poll interval", self.options.poll_interval),
            ("tyre refresh interval", self.options.tyre_refresh_interval),
        ] {
            if value.is_zero() {
                return Err(Error::config(format!("The {name} must be greater than zero")));
            }
        }

        if self.options.channel_capacity == 0 {
            return Err(Error::config("The channel capacity must be greater than zero"));
        }
        Ok(())
    }

    /// Validates the hub name and topic list.
    fn validate_subscription(&self) -> Result<()> {
        if self.options.hub.is_empty() {
            return Err(Error::config("Hub name is required"));
        }
        if self.options.topics.is_empty() {
            return Err(Error::config(
                "At least one topic is required. Use .topics() to set them.",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_options() {
        let builder = FeedClientBuilder::new();
        assert_eq!(builder.options, FeedOptions::new());
        assert!(builder.http.is_none());
    }

    #[test]
    fn test_setters() {
        let builder = FeedClientBuilder::new()
            .live_base_url("http://localhost:1")
            .static_base_url("http://localhost:2")
            .topics(["TimingData"])
            .poll_interval(Duration::from_millis(10));

        assert_eq!(builder.options.live_base_url, "http://localhost:1");
        assert_eq!(builder.options.static_base_url, "http://localhost:2");
        assert_eq!(builder.options.topics, ["TimingData"]);
        assert_eq!(builder.options.poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn test_build_with_defaults() {
        assert!(FeedClientBuilder::new().build().is_ok());
    }

    #[test]
    fn test_build_fails_with_invalid_static_url() {
        let err = FeedClientBuilder::new()
            .static_base_url("archive")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("static"));
    }

    #[test]
    fn test_build_fails_with_socket_static_url() {
        let err = FeedClientBuilder::new()
            .static_base_url("wss://archive.test")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_build_fails_with_invalid_live_url() {
        let result = FeedClientBuilder::new().live_base_url("ftp://live.test").build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_build_fails_with_zero_interval() {
        let err = FeedClientBuilder::new()
            .poll_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("poll interval"));
    }

    #[test]
    fn test_build_fails_without_topics() {
        let err = FeedClientBuilder::new()
            .topics(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("topic"));
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = FeedClientBuilder::new().live_base_url("http://localhost:1");
        let cloned = builder.clone();
        assert_eq!(builder.options, cloned.options);
    }
}
