//! Error types for live timing ingestion.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Low-level building blocks (negotiation, static fetches, inflation) return
//! [`Result<T>`]. The ingestion loops built on top of them recover from
//! every variant internally: transport failures are retried or replaced by
//! an empty result, decode failures are replaced by an empty value.
//!
//! ```ignore
//! use livetiming::{Result, StaticClient};
//!
//! async fn example(client: &StaticClient) -> Result<()> {
//!     let season = client.season(2024).await?;
//!     println!("{} meetings", season.meetings.len());
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Transport | [`Error::Negotiation`], [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::Http`], [`Error::WebSocket`] |
//! | Decode | [`Error::Decode`], [`Error::Base64`], [`Error::Json`], [`Error::Io`] |
//! | Protocol | [`Error::Protocol`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use base64::DecodeError as Base64Error;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Handshake did not produce a connection token.
    ///
    /// Usually means there is no live session right now.
    #[error("Negotiation failed: {message}")]
    Negotiation {
        /// Description of the negotiation failure.
        message: String,
    },

    /// Socket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Socket closed by the remote end.
    #[error("Connection closed")]
    ConnectionClosed,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    // ========================================================================
    // Decode Errors
    // ========================================================================
    /// Payload could not be decoded.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    /// Base64 error in a compressed topic.
    #[error("Base64 error: {0}")]
    Base64(#[from] Base64Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (raw inflate).
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Frame shape does not match the hub protocol.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a negotiation error.
    #[inline]
    pub fn negotiation(message: impl Into<String>) -> Self {
        Self::Negotiation {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a transport error.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Negotiation { .. }
                | Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::Http(_)
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a decode error.
    #[inline]
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Base64(_) | Self::Json(_) | Self::Io(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::negotiation("no ConnectionToken");
        assert_eq!(err.to_string(), "Negotiation failed: no ConnectionToken");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("poll interval must be non-zero");
        assert_eq!(
            err.to_string(),
            "Configuration error: poll interval must be non-zero"
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::negotiation("x").is_transport_error());
        assert!(Error::connection("x").is_transport_error());
        assert!(Error::ConnectionClosed.is_transport_error());
        assert!(!Error::decode("x").is_transport_error());
    }

    #[test]
    fn test_is_decode_error() {
        let io_err: Error = IoError::new(ErrorKind::InvalidData, "corrupt deflate").into();
        assert!(io_err.is_decode_error());
        assert!(Error::decode("bad").is_decode_error());
        assert!(!Error::protocol("bad").is_decode_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_recoverable());
    }
}
