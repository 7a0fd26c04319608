//! Live feed connection and event loop.
//!
//! [`LiveConnection`] owns the handshake and socket lifecycle of one feed
//! session, decodes inbound frames into a [`LiveState`] and republishes
//! every change as an immutable snapshot.
//!
//! # Event Loop
//!
//! ```text
//! socket reader task ──(bounded channel)──► processing loop ──► watch<Arc<LiveState>>
//! ```
//!
//! The reader only forwards text frames, so frames are decoded strictly in
//! arrival order by a single writer. On negotiation failure, socket error
//! or close, the state is cleared and a reconnect is attempted after a
//! fixed delay, indefinitely.
//!
//! # Cancellation
//!
//! [`LiveConnection::connect`] and [`LiveConnection::disconnect`] advance a
//! shared generation before aborting the running loop. Every publish checks
//! the generation under the same lock, so a cancelled loop can never
//! publish again.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::lifecycle::Generation;
use crate::protocol::{
    DEFAULT_STALE_FRAME_LIMIT, DEFAULT_TOPICS, FrameOutcome, LiveState, MessageDecoder,
    SubscribeRequest,
};

use super::negotiate::{HubEndpoint, Negotiated};

// ============================================================================
// Constants
// ============================================================================

/// Fixed delay between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Capacity of the reader-to-decoder channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// Types
// ============================================================================

type SocketReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Published live state.
pub type Snapshot = Arc<LiveState>;

// ============================================================================
// ConnectionStatus
// ============================================================================

/// Lifecycle phase of a [`LiveConnection`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not connected and not trying to.
    #[default]
    Idle,
    /// First handshake in progress.
    Negotiating,
    /// Socket open and subscribed.
    Connected,
    /// Waiting for or running a reconnect attempt.
    Reconnecting,
}

// ============================================================================
// ConnectionConfig
// ============================================================================

/// Settings of a [`LiveConnection`].
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Hub location.
    pub endpoint: HubEndpoint,
    /// Topics to subscribe.
    pub topics: Vec<String>,
    /// Delay before each reconnect attempt.
    pub reconnect_delay: Duration,
    /// Consecutive empty frames tolerated before the state is reset.
    pub stale_frame_limit: u32,
    /// Capacity of the inbound frame channel.
    pub channel_capacity: usize,
}

impl ConnectionConfig {
    /// Creates a config with default topics and timings.
    #[must_use]
    pub fn new(endpoint: HubEndpoint) -> Self {
        Self {
            endpoint,
            topics: DEFAULT_TOPICS.iter().map(ToString::to_string).collect(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            stale_frame_limit: DEFAULT_STALE_FRAME_LIMIT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

// ============================================================================
// LiveConnection
// ============================================================================

/// Owned push-path session.
///
/// At most one socket is open at a time. Dropping the connection
/// disconnects it.
pub struct LiveConnection {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// State shared with the event loop.
struct Shared {
    config: ConnectionConfig,
    http: reqwest::Client,
    generation: Generation,
    state: watch::Sender<Snapshot>,
    status: watch::Sender<ConnectionStatus>,
    attempts: AtomicU32,
}

impl LiveConnection {
    /// Creates an idle connection.
    #[must_use]
    pub fn new(http: reqwest::Client, config: ConnectionConfig) -> Self {
        let (state, _) = watch::channel(Snapshot::default());
        let (status, _) = watch::channel(ConnectionStatus::Idle);

        Self {
            shared: Arc::new(Shared {
                config,
                http,
                generation: Generation::default(),
                state,
                status,
                attempts: AtomicU32::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    /// Starts the handshake and event loop.
    ///
    /// Any running session is torn down first. Must be called within a
    /// tokio runtime.
    pub fn connect(&self) {
        let mut task = self.task.lock();
        let token = self.shared.generation.advance();
        if let Some(previous) = task.take() {
            previous.abort();
            debug!("Tore down previous session");
        }

        self.shared.attempts.store(0, Ordering::Relaxed);
        self.shared.state.send_replace(Snapshot::default());
        self.shared.status.send_replace(ConnectionStatus::Negotiating);

        *task = Some(tokio::spawn(Self::run_event_loop(
            Arc::clone(&self.shared),
            token,
        )));
    }

    /// Stops the session, cancelling any pending reconnect, and clears the
    /// state. Idempotent.
    pub fn disconnect(&self) {
        let mut task = self.task.lock();
        self.shared.generation.advance();
        if let Some(running) = task.take() {
            running.abort();
            info!("Live feed disconnected");
        }

        self.shared.state.send_replace(Snapshot::default());
        self.shared.status.send_replace(ConnectionStatus::Idle);
    }

    /// Returns the latest state snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.shared.state.borrow())
    }

    /// Subscribes to state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.state.subscribe()
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    /// Subscribes to lifecycle changes.
    #[must_use]
    pub fn status_changes(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Returns the number of reconnect attempts since the last successful
    /// subscribe.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.shared.attempts.load(Ordering::Relaxed)
    }

    /// Returns the connection settings.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    /// Reconnect loop of one session generation.
    async fn run_event_loop(shared: Arc<Shared>, token: u64) {
        loop {
            match Self::run_socket(&shared, token).await {
                Ok(()) => return,
                Err(e) => warn!(error = %e, "Live feed connection lost"),
            }

            let published = shared.generation.run_if_current(token, || {
                shared.state.send_replace(Snapshot::default());
                shared.status.send_replace(ConnectionStatus::Reconnecting);
            });
            if published.is_none() {
                return;
            }

            let attempt = shared.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            info!(
                attempt,
                delay_ms = shared.config.reconnect_delay.as_millis() as u64,
                "Reconnect scheduled"
            );
            sleep(shared.config.reconnect_delay).await;
        }
    }

    /// Runs one handshake and socket until it fails.
    ///
    /// Returns `Ok(())` only when this generation was cancelled.
    async fn run_socket(shared: &Shared, token: u64) -> Result<()> {
        let endpoint = &shared.config.endpoint;
        let negotiated = endpoint.negotiate(&shared.http).await?;

        let request = socket_request(endpoint, &negotiated)?;
        let (ws_stream, _) = connect_async(request).await?;
        let (mut ws_write, ws_read) = ws_stream.split();
        debug!("Socket open");

        let subscribe = SubscribeRequest::new(endpoint.hub(), &shared.config.topics);
        ws_write
            .send(Message::Text(serde_json::to_string(&subscribe)?.into()))
            .await?;

        let opened = shared.generation.run_if_current(token, || {
            shared.attempts.store(0, Ordering::Relaxed);
            shared.state.send_replace(Snapshot::default());
            shared.status.send_replace(ConnectionStatus::Connected);
        });
        if opened.is_none() {
            return Ok(());
        }
        info!(topics = shared.config.topics.len(), "Subscribed to live feed");

        let (frame_tx, mut frame_rx) = mpsc::channel(shared.config.channel_capacity.max(1));
        let _reader = ReaderGuard(tokio::spawn(Self::read_socket(ws_read, frame_tx)));
        let mut decoder = MessageDecoder::new(shared.config.stale_frame_limit);

        while let Some(frame) = frame_rx.recv().await {
            let text = frame?;
            let applied = shared.generation.run_if_current(token, || {
                shared.state.send_if_modified(|snapshot| {
                    let outcome = decoder.apply(&text, Arc::make_mut(snapshot));
                    if outcome == FrameOutcome::StaleReset {
                        info!("Stale feed, state reset");
                    }
                    outcome.changed_state()
                })
            });
            if applied.is_none() {
                return Ok(());
            }
        }

        let _ = ws_write.close().await;
        Err(Error::ConnectionClosed)
    }

    /// Forwards text frames until the socket ends.
    async fn read_socket(mut ws_read: SocketReader, frame_tx: mpsc::Sender<Result<String>>) {
        while let Some(message) = ws_read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    trace!(len = text.len(), "Frame received");
                    if frame_tx.send(Ok(text.as_str().to_owned())).await.is_err() {
                        break;
                    }
                }

                Ok(Message::Close(_)) => {
                    debug!("Socket closed by remote");
                    break;
                }

                Err(e) => {
                    let _ = frame_tx.send(Err(Error::from(e))).await;
                    break;
                }

                // Ignore Binary, Ping, Pong
                Ok(_) => {}
            }
        }
    }
}

impl std::fmt::Debug for LiveConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveConnection")
            .field("status", &self.status())
            .field("attempts", &self.attempts())
            .finish_non_exhaustive()
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        self.shared.generation.advance();
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

/// Builds the socket upgrade request, replaying the negotiated cookie.
fn socket_request(endpoint: &HubEndpoint, negotiated: &Negotiated) -> Result<Request> {
    let mut request = endpoint
        .socket_url(&negotiated.token)?
        .into_client_request()?;
    if let Some(cookie) = &negotiated.cookie {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| Error::connection(format!("Invalid session cookie: {e}")))?;
        request.headers_mut().insert(COOKIE, value);
    }
    Ok(request)
}

/// Aborts the reader task when the session ends.
struct ReaderGuard(JoinHandle<()>);

impl Drop for ReaderGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tokio_tungstenite::accept_async;

    use crate::protocol::inflate::tests::compress;
    use crate::testing::{Route, bind, peek_path, respond};

    const WAIT: Duration = Duration::from_secs(5);

    fn config(base: &str) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(HubEndpoint::new(base).unwrap());
        config.reconnect_delay = Duration::from_millis(20);
        config
    }

    async fn wait_until(mut done: impl FnMut() -> bool) {
        timeout(WAIT, async {
            while !done() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    /// Serves negotiation over HTTP and a scripted socket session.
    async fn hub_server(frames: Vec<Value>) -> (String, oneshot::Receiver<Value>) {
        let (listener, base) = bind().await;
        let (subscribe_tx, subscribe_rx) = oneshot::channel();
        let routes = vec![Route::ok("/signalr/negotiate", r#"{"ConnectionToken":"tok"}"#)];

        tokio::spawn(async move {
            let mut subscribe_tx = Some(subscribe_tx);
            while let Ok((stream, _)) = listener.accept().await {
                if peek_path(&stream).await.as_deref() != Some("/signalr/connect") {
                    let routes = routes.clone();
                    tokio::spawn(async move { respond(stream, &routes).await });
                    continue;
                }

                let mut ws = accept_async(stream).await.unwrap();
                if let Some(Ok(Message::Text(text))) = ws.next().await
                    && let Some(tx) = subscribe_tx.take()
                {
                    let _ = tx.send(serde_json::from_str(text.as_str()).unwrap());
                }
                for frame in &frames {
                    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
                }
                // Hold the socket open until the client goes away.
                while let Some(Ok(_)) = ws.next().await {}
            }
        });

        (base, subscribe_rx)
    }

    #[test]
    fn test_default_config() {
        let config = ConnectionConfig::new(HubEndpoint::new("https://live.test").unwrap());
        assert_eq!(config.topics.len(), 15);
        assert_eq!(config.topics[1], "CarData.z");
        assert_eq!(config.reconnect_delay, Duration::from_secs(10));
        assert_eq!(config.stale_frame_limit, 5);
    }

    #[tokio::test]
    async fn test_connect_subscribes_and_applies_frames() {
        let (base, subscribe) = hub_server(vec![
            json!({"R": {"DriverList": {"1": {"Tla": "VER"}}}, "I": "1"}),
            json!({"M": [{"H": "Streaming", "M": "feed", "A": ["TimingData", {"Lines": {"1": {"Position": "1"}}}, "t"]}]}),
            json!({"M": [{"H": "Streaming", "M": "feed", "A": ["Position.z", compress(&json!({"Position": []})), "t"]}]}),
        ])
        .await;

        let connection = LiveConnection::new(reqwest::Client::new(), config(&base));
        let mut states = connection.subscribe();
        connection.connect();

        let subscribe = timeout(WAIT, subscribe).await.unwrap().unwrap();
        assert_eq!(subscribe["H"], "Streaming");
        assert_eq!(subscribe["M"], "Subscribe");
        assert_eq!(subscribe["I"], 1);
        assert_eq!(subscribe["A"][0].as_array().unwrap().len(), 15);

        let state = timeout(WAIT, async {
            loop {
                let state = Arc::clone(&states.borrow_and_update());
                if state.topic("Position").is_some() {
                    return state;
                }
                states.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        assert_eq!(state.topic("DriverList").unwrap()["1"]["Tla"], "VER");
        assert_eq!(state.topic("TimingData").unwrap()["Lines"]["1"]["Position"], "1");
        assert!(state.topic("Position.z").is_none());
        assert_eq!(connection.status(), ConnectionStatus::Connected);
        assert_eq!(connection.attempts(), 0);

        connection.disconnect();
        assert!(connection.snapshot().is_empty());
        assert_eq!(connection.status(), ConnectionStatus::Idle);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_keeps_retrying() {
        let (listener, base) = bind().await;
        drop(listener);

        let connection = LiveConnection::new(reqwest::Client::new(), config(&base));
        connection.connect();

        wait_until(|| connection.attempts() >= 2).await;
        assert_eq!(connection.status(), ConnectionStatus::Reconnecting);
        assert!(connection.snapshot().is_empty());

        connection.disconnect();
        let attempts = connection.attempts();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(connection.attempts(), attempts);
        assert_eq!(connection.status(), ConnectionStatus::Idle);
    }

    #[tokio::test]
    async fn test_missing_token_schedules_reconnect() {
        let (listener, base) = bind().await;
        tokio::spawn(async move {
            let routes = vec![Route::ok("/signalr/negotiate", "{}")];
            while let Ok((stream, _)) = listener.accept().await {
                respond(stream, &routes).await;
            }
        });

        let connection = LiveConnection::new(reqwest::Client::new(), config(&base));
        connection.connect();

        wait_until(|| connection.attempts() >= 1).await;
        connection.disconnect();
    }

    #[test]
    fn test_socket_request_replays_cookie() {
        let endpoint = HubEndpoint::new("https://live.test").unwrap();
        let negotiated = Negotiated {
            token: "tok".into(),
            cookie: Some("GCLB=abc".into()),
        };

        let request = socket_request(&endpoint, &negotiated).unwrap();
        assert_eq!(request.uri().scheme_str(), Some("wss"));
        assert_eq!(request.headers()[COOKIE], "GCLB=abc");
    }

    #[test]
    fn test_socket_request_rejects_invalid_cookie() {
        let endpoint = HubEndpoint::new("https://live.test").unwrap();
        let negotiated = Negotiated {
            token: "tok".into(),
            cookie: Some("GCLB=abc\nInjected: 1".into()),
        };

        let err = socket_request(&endpoint, &negotiated).unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
        assert!(err.is_transport_error());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let connection = LiveConnection::new(
            reqwest::Client::new(),
            config("http://127.0.0.1:9"),
        );
        connection.disconnect();
        connection.disconnect();
        assert_eq!(connection.status(), ConnectionStatus::Idle);
        assert!(connection.snapshot().is_empty());
    }
}
