//! Feed client coordinator.
//!
//! The [`FeedClient`] owns both ingestion paths and makes sure only one of
//! them drives the session at a time: starting the live connection stops
//! any polling session, and starting a polling session disconnects the live
//! feed.
//!
//! # Example
//!
//! ```no_run
//! use livetiming::FeedClient;
//!
//! # async fn example() -> livetiming::Result<()> {
//! let client = FeedClient::builder().build()?;
//!
//! client.connect_live().await;
//! let mut states = client.live().subscribe();
//! states.changed().await.ok();
//!
//! for record in client.standings() {
//!     println!("{} {}", record.position, record.driver_code);
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::info;

use crate::error::Result;
use crate::polling::{PollingSession, Positions, Season, StaticClient, Standings};
use crate::stream::PositionSample;
use crate::timing::{TimingRecord, positions_from_state, standings_from_state};
use crate::track::{GeometrySource, HttpGeometrySource, TrackGeometry};
use crate::transport::{ConnectionStatus, LiveConnection};

use super::builder::FeedClientBuilder;
use super::options::FeedOptions;

// ============================================================================
// IngestionMode
// ============================================================================

/// Which ingestion path currently drives the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionMode {
    /// Nothing running.
    Idle,
    /// Live socket connection.
    Live,
    /// Fixed-interval polling.
    Polling,
}

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the client.
pub(crate) struct FeedClientInner {
    /// Options the client was built with.
    pub options: FeedOptions,

    /// Static archive client.
    pub statics: StaticClient,

    /// Circuit geometry source.
    pub geometry: HttpGeometrySource,

    /// Live connection (idle until connected).
    pub live: LiveConnection,

    /// Running polling session, if any.
    pub polling: Mutex<Option<PollingSession>>,

    /// Serializes switches between ingestion paths.
    pub switching: AsyncMutex<()>,
}

// ============================================================================
// FeedClient
// ============================================================================

/// Live timing client.
///
/// Cloning is cheap; clones share the same session.
#[derive(Clone)]
pub struct FeedClient {
    /// Shared inner state.
    pub(crate) inner: Arc<FeedClientInner>,
}

// ============================================================================
// FeedClient - Display
// ============================================================================

impl fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedClient")
            .field("mode", &self.mode())
            .field("live_base_url", &self.inner.options.live_base_url)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// FeedClient - Public API
// ============================================================================

impl FeedClient {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> FeedClientBuilder {
        FeedClientBuilder::new()
    }

    /// Creates a client from validated options.
    pub(crate) fn new(options: FeedOptions, http: reqwest::Client) -> Result<Self> {
        let live = LiveConnection::new(http.clone(), options.connection_config()?);
        let statics = StaticClient::new(http.clone(), options.static_base_url.as_str());
        let geometry = HttpGeometrySource::new(http, options.geometry_base_url.as_str());

        Ok(Self {
            inner: Arc::new(FeedClientInner {
                options,
                statics,
                geometry,
                live,
                polling: Mutex::new(None),
                switching: AsyncMutex::new(()),
            }),
        })
    }

    /// Returns the client options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &FeedOptions {
        &self.inner.options
    }

    /// Returns the live connection.
    #[inline]
    #[must_use]
    pub fn live(&self) -> &LiveConnection {
        &self.inner.live
    }

    /// Returns the static archive client.
    #[inline]
    #[must_use]
    pub fn static_client(&self) -> &StaticClient {
        &self.inner.statics
    }

    /// Returns the circuit geometry source.
    #[inline]
    #[must_use]
    pub fn geometry_source(&self) -> &HttpGeometrySource {
        &self.inner.geometry
    }

    /// Returns the active ingestion path.
    #[must_use]
    pub fn mode(&self) -> IngestionMode {
        if self.inner.polling.lock().is_some() {
            IngestionMode::Polling
        } else if self.inner.live.status() != ConnectionStatus::Idle {
            IngestionMode::Live
        } else {
            IngestionMode::Idle
        }
    }

    /// Starts the live feed, stopping any polling session first.
    pub async fn connect_live(&self) {
        let _switching = self.inner.switching.lock().await;
        self.stop_polling();
        self.inner.live.connect();
        info!("Live ingestion started");
    }

    /// Starts polling `session_path`, disconnecting the live feed first.
    ///
    /// Returns subscriptions to the polled timing table and positions.
    pub async fn start_polling(
        &self,
        session_path: &str,
    ) -> (watch::Receiver<Standings>, watch::Receiver<Positions>) {
        let _switching = self.inner.switching.lock().await;
        self.inner.live.disconnect();
        self.stop_polling();

        let session = PollingSession::start(
            self.inner.statics.clone(),
            session_path,
            self.inner.options.poll_intervals(),
        )
        .await;
        let feeds = (session.standings(), session.positions());
        *self.inner.polling.lock() = Some(session);
        feeds
    }

    /// Stops whichever ingestion path is running. Idempotent.
    pub async fn stop(&self) {
        let _switching = self.inner.switching.lock().await;
        self.inner.live.disconnect();
        self.stop_polling();
    }

    /// Returns the current timing table of the active path.
    #[must_use]
    pub fn standings(&self) -> Vec<TimingRecord> {
        if let Some(session) = self.inner.polling.lock().as_ref() {
            return session.latest_standings().as_ref().clone();
        }
        standings_from_state(&self.inner.live.snapshot())
    }

    /// Returns the current car positions of the active path.
    #[must_use]
    pub fn positions(&self) -> Vec<PositionSample> {
        if let Some(session) = self.inner.polling.lock().as_ref() {
            return session.latest_positions().as_ref().clone();
        }
        positions_from_state(&self.inner.live.snapshot())
    }

    /// Fetches the season catalog of `year`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched or parsed.
    pub async fn season(&self, year: u16) -> Result<Season> {
        self.inner.statics.season(year).await
    }

    /// Fetches the layout of a circuit.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry cannot be fetched or parsed.
    pub async fn track_geometry(&self, circuit_key: u32, year: u16) -> Result<TrackGeometry> {
        self.inner.geometry.geometry(circuit_key, year).await
    }

    fn stop_polling(&self) {
        if let Some(mut session) = self.inner.polling.lock().take() {
            session.stop();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::time::timeout;

    use crate::testing::{Route, bind, http_server};

    async fn archive() -> String {
        http_server(vec![
            Route::ok(
                "/s/DriverList.json",
                r#"{"4":{"RacingNumber":"4","Tla":"NOR","TeamName":"McLaren"}}"#,
            ),
            Route::ok(
                "/s/TimingData.jsonStream",
                "00:00:01.000{\"Lines\":{\"4\":{\"Position\":\"1\",\"GapToLeader\":\"\"}}}",
            ),
        ])
        .await
    }

    async fn client(static_base: &str) -> FeedClient {
        let (listener, live_base) = bind().await;
        drop(listener);

        FeedClient::builder()
            .live_base_url(live_base)
            .static_base_url(static_base)
            .reconnect_delay(Duration::from_millis(20))
            .poll_interval(Duration::from_millis(20))
            .tyre_refresh_interval(Duration::from_millis(20))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let client = client("http://127.0.0.1:9").await;
        assert_eq!(client.mode(), IngestionMode::Idle);
        assert!(client.standings().is_empty());
        assert!(client.positions().is_empty());
    }

    #[tokio::test]
    async fn test_polling_replaces_live() {
        let base = archive().await;
        let client = client(&base).await;

        client.connect_live().await;
        assert_eq!(client.mode(), IngestionMode::Live);

        let (mut standings, _positions) = client.start_polling("s/").await;
        assert_eq!(client.mode(), IngestionMode::Polling);
        assert_eq!(client.live().status(), ConnectionStatus::Idle);

        timeout(Duration::from_secs(5), async {
            while standings.borrow_and_update().is_empty() {
                standings.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        let table = client.standings();
        assert_eq!(table[0].driver_code.as_str(), "NOR");
        assert_eq!(table[0].team_name, "McLaren");
    }

    #[tokio::test]
    async fn test_live_replaces_polling() {
        let base = archive().await;
        let client = client(&base).await;

        let _feeds = client.start_polling("s/").await;
        client.connect_live().await;

        assert_eq!(client.mode(), IngestionMode::Live);
        assert!(client.inner.polling.lock().is_none());

        client.stop().await;
        client.stop().await;
        assert_eq!(client.mode(), IngestionMode::Idle);
    }
}
