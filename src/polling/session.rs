//! Fixed-interval polling of one session.
//!
//! # Loops
//!
//! | Loop | Interval | Output |
//! |------|----------|--------|
//! | timing | poll interval | ordered [`TimingRecord`] list |
//! | position | poll interval | latest [`PositionSample`] list |
//! | tyres | tyre refresh interval | tyre cache swap |
//!
//! The roster is fetched once before the loops start. A failed fetch on any
//! tick yields an empty result for that tick; the loop keeps going.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::lifecycle::Generation;
use crate::stream::{PositionSample, latest_position_snapshot, line_updates, samples_from_snapshot};
use crate::timing::{Reconciler, Roster, SharedCache, TimingRecord, TyreCache};

use super::client::StaticClient;

// ============================================================================
// Types
// ============================================================================

/// Published timing table.
pub type Standings = Arc<Vec<TimingRecord>>;

/// Published car positions.
pub type Positions = Arc<Vec<PositionSample>>;

// ============================================================================
// PollIntervals
// ============================================================================

/// Cadence of the polling loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// Timing and position fetch interval.
    pub poll: Duration,
    /// Tyre stint refresh interval.
    pub tyre_refresh: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            poll: Duration::from_secs(1),
            tyre_refresh: Duration::from_secs(5),
        }
    }
}

// ============================================================================
// PollingSession
// ============================================================================

/// Running poll-path ingestion of one session.
///
/// Dropping the session stops it.
#[derive(Debug)]
pub struct PollingSession {
    session_path: String,
    roster: SharedCache<Roster>,
    standings: watch::Receiver<Standings>,
    positions: watch::Receiver<Positions>,
    generation: Generation,
    token: u64,
    tasks: Vec<JoinHandle<()>>,
}

impl PollingSession {
    /// Fetches the roster and starts the polling loops.
    ///
    /// A roster fetch failure is logged and treated as an empty roster.
    pub async fn start(
        client: StaticClient,
        session_path: impl Into<String>,
        intervals: PollIntervals,
    ) -> Self {
        let session_path = session_path.into();

        let roster = match client.roster(&session_path).await {
            Ok(roster) => roster,
            Err(e) => {
                warn!(error = %e, path = %session_path, "Roster fetch failed, using empty roster");
                Roster::new()
            }
        };
        info!(path = %session_path, drivers = roster.len(), "Polling session started");

        let roster = SharedCache::new(roster);
        let tyres: SharedCache<TyreCache> = SharedCache::default();
        let (standings_tx, standings) = watch::channel(Standings::default());
        let (positions_tx, positions) = watch::channel(Positions::default());

        let generation = Generation::default();
        let token = generation.advance();

        let timing = TimingLoop {
            client: client.clone(),
            path: session_path.clone(),
            reconciler: Reconciler::with_caches(roster.clone(), tyres.clone()),
            output: standings_tx,
            generation: generation.clone(),
            token,
        };
        let position = PositionLoop {
            client: client.clone(),
            path: session_path.clone(),
            output: positions_tx,
            generation: generation.clone(),
            token,
        };
        let tyre = TyreLoop {
            client,
            path: session_path.clone(),
            tyres,
            generation: generation.clone(),
            token,
        };

        let tasks = vec![
            tokio::spawn(timing.run(intervals.poll)),
            tokio::spawn(position.run(intervals.poll)),
            tokio::spawn(tyre.run(intervals.tyre_refresh)),
        ];

        Self {
            session_path,
            roster,
            standings,
            positions,
            generation,
            token,
            tasks,
        }
    }

    /// Returns the polled session path.
    #[inline]
    #[must_use]
    pub fn session_path(&self) -> &str {
        &self.session_path
    }

    /// Returns the roster fetched at start.
    #[inline]
    #[must_use]
    pub fn roster(&self) -> Arc<Roster> {
        self.roster.load()
    }

    /// Subscribes to the timing table.
    #[must_use]
    pub fn standings(&self) -> watch::Receiver<Standings> {
        self.standings.clone()
    }

    /// Subscribes to car positions.
    #[must_use]
    pub fn positions(&self) -> watch::Receiver<Positions> {
        self.positions.clone()
    }

    /// Returns the latest published timing table.
    #[must_use]
    pub fn latest_standings(&self) -> Standings {
        Arc::clone(&self.standings.borrow())
    }

    /// Returns the latest published positions.
    #[must_use]
    pub fn latest_positions(&self) -> Positions {
        Arc::clone(&self.positions.borrow())
    }

    /// Returns `true` until [`Self::stop`] is called.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.generation.is_current(self.token)
    }

    /// Stops every loop. Idempotent.
    ///
    /// Nothing is published after this returns.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.generation.advance();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!(path = %self.session_path, "Polling session stopped");
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Loops
// ============================================================================

struct TimingLoop {
    client: StaticClient,
    path: String,
    reconciler: Reconciler,
    output: watch::Sender<Standings>,
    generation: Generation,
    token: u64,
}

impl TimingLoop {
    async fn run(mut self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.generation.is_current(self.token) {
            ticker.tick().await;

            match self.client.timing_stream(&self.path).await {
                Ok(raw) => {
                    let applied = self.reconciler.apply_all(line_updates(&raw));
                    debug!(applied, "Timing tick");
                }
                Err(e) => warn!(error = %e, "Timing fetch failed"),
            }

            let standings = Arc::new(self.reconciler.standings());
            self.generation
                .run_if_current(self.token, || self.output.send_replace(standings));
        }
    }
}

struct PositionLoop {
    client: StaticClient,
    path: String,
    output: watch::Sender<Positions>,
    generation: Generation,
    token: u64,
}

impl PositionLoop {
    async fn run(self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.generation.is_current(self.token) {
            ticker.tick().await;

            let samples = match self.client.position_stream(&self.path).await {
                Ok(raw) => latest_position_snapshot(&raw)
                    .map(|snapshot| samples_from_snapshot(&snapshot))
                    .unwrap_or_default(),
                Err(e) => {
                    warn!(error = %e, "Position fetch failed");
                    Vec::new()
                }
            };

            let samples = Arc::new(samples);
            self.generation
                .run_if_current(self.token, || self.output.send_replace(samples));
        }
    }
}

struct TyreLoop {
    client: StaticClient,
    path: String,
    tyres: SharedCache<TyreCache>,
    generation: Generation,
    token: u64,
}

impl TyreLoop {
    async fn run(self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.generation.is_current(self.token) {
            ticker.tick().await;

            match self.client.tyre_stints(&self.path).await {
                Ok(fresh) => {
                    debug!(cars = fresh.len(), "Tyre refresh");
                    self.generation.run_if_current(self.token, || {
                        self.tyres.update(|current| current.refreshed(fresh));
                    });
                }
                Err(e) => warn!(error = %e, "Tyre fetch failed"),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
