//! Static resource client.
//!
//! Every file of a session lives under `<base>/<sessionPath>`. The server
//! prefixes JSON bodies with a UTF-8 byte order mark, which is stripped
//! before parsing.

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::Result;
use crate::timing::{Roster, TyreCache};

use super::catalog::Season;

// ============================================================================
// Constants
// ============================================================================

const BOM: char = '\u{feff}';

/// Roster file.
pub const DRIVER_LIST_FILE: &str = "DriverList.json";

/// Timing stream file.
pub const TIMING_STREAM_FILE: &str = "TimingData.jsonStream";

/// Tyre stint file.
pub const TYRE_STINTS_FILE: &str = "TyreStintSeries.json";

/// Position stream file.
pub const POSITION_STREAM_FILE: &str = "Position.z.jsonStream";

// ============================================================================
// StaticClient
// ============================================================================

/// Plain request/response client for the static timing archive.
#[derive(Debug, Clone)]
pub struct StaticClient {
    http: reqwest::Client,
    base_url: String,
}

impl StaticClient {
    /// Creates a client rooted at `base_url`.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Returns the base URL.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins a relative resource path onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Fetches a resource as text with any leading BOM removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Http`] on transport failure or a non-success
    /// status.
    pub async fn fetch_text(&self, path: &str) -> Result<String> {
        let url = self.url(path);
        trace!(%url, "GET");

        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(match body.strip_prefix(BOM) {
            Some(stripped) => stripped.to_string(),
            None => body,
        })
    }

    /// Fetches and deserializes a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Http`] on fetch failure or
    /// [`crate::Error::Json`] on a malformed body.
    pub async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let text = self.fetch_text(path).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetches the season catalog of `year`.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_json`].
    pub async fn season(&self, year: u16) -> Result<Season> {
        let season: Season = self.fetch_json(&format!("{year}/Index.json")).await?;
        debug!(year, meetings = season.meetings.len(), "Season catalog fetched");
        Ok(season)
    }

    /// Fetches the roster of a session.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_json`].
    pub async fn roster(&self, session_path: &str) -> Result<Roster> {
        let value: serde_json::Value = self
            .fetch_json(&session_file(session_path, DRIVER_LIST_FILE))
            .await?;
        Ok(Roster::from_value(&value))
    }

    /// Fetches the raw timing stream of a session.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_text`].
    pub async fn timing_stream(&self, session_path: &str) -> Result<String> {
        self.fetch_text(&session_file(session_path, TIMING_STREAM_FILE))
            .await
    }

    /// Fetches the tyre stints of a session.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_json`].
    pub async fn tyre_stints(&self, session_path: &str) -> Result<TyreCache> {
        let value: serde_json::Value = self
            .fetch_json(&session_file(session_path, TYRE_STINTS_FILE))
            .await?;
        Ok(TyreCache::from_stint_series(&value))
    }

    /// Fetches the raw position stream of a session.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_text`].
    pub async fn position_stream(&self, session_path: &str) -> Result<String> {
        self.fetch_text(&session_file(session_path, POSITION_STREAM_FILE))
            .await
    }
}

/// Joins a session path and a file name.
#[must_use]
pub fn session_file(session_path: &str, file: &str) -> String {
    if session_path.is_empty() || session_path.ends_with('/') {
        format!("{session_path}{file}")
    } else {
        format!("{session_path}/{file}")
    }
}

// ============================================================================
// Tests
// ============================================================================
