//! Realtime socket with auto-reconnect.
//!
//! Connects to the backend's `/realtime` endpoint for a fixed set of
//! channels and streams parsed deliveries through a
//! [`tokio::sync::broadcast`] channel. Handles reconnection with
//! exponential backoff + jitter and keeps the connection alive with
//! application-level pings.
//!
//! Every `connected` frame from the server bumps a connection epoch
//! published through a [`tokio::sync::watch`] channel. An epoch of 0
//! means the channels are not registered yet; a later bump means the
//! socket reconnected and deliveries may have been missed in between.
//!
//! # Example
//!
//! ```rust,ignore
//! use livewrite_api::{AppwriteClient, Credentials, TransportConfig};
//! use livewrite_api::realtime::ReconnectConfig;
//!
//! let client = AppwriteClient::new(
//!     "https://cloud.appwrite.io/v1",
//!     "my-project",
//!     Credentials::Anonymous,
//!     &TransportConfig::default(),
//! )?;
//! let handle = client.subscribe(
//!     vec!["databases.main.collections.posts.documents".into()],
//!     ReconnectConfig::default(),
//! )?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{:?} -> {}", event.events, event.payload);
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::models::RealtimeEvent;

// ── Tuning ───────────────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for socket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

/// Per-connection options derived from the client's credentials.
#[derive(Debug, Clone, Default)]
pub(crate) struct RealtimeOptions {
    /// `Cookie` header for the upgrade request (cookie-jar sessions).
    pub cookie: Option<String>,
    /// Session secret, sent as an `authentication` frame after connect.
    pub session: Option<SecretString>,
    /// The HTTP side accepts invalid certificates. The socket does not,
    /// so this only triggers a warning.
    pub insecure: bool,
}

// ── RealtimeHandle ───────────────────────────────────────────────────

/// Handle to a running realtime socket.
///
/// The socket lives as long as the handle: dropping it cancels the
/// background task.
pub struct RealtimeHandle {
    event_rx: broadcast::Receiver<Arc<RealtimeEvent>>,
    connections: watch::Receiver<u64>,
    cancel: CancellationToken,
}

impl RealtimeHandle {
    /// Spawn the connection loop for `channels`.
    ///
    /// Returns immediately; the first connection attempt happens on the
    /// spawned task. Wait on [`connections`](Self::connections) to know
    /// when the server has registered the channels. Must be called from
    /// within a Tokio runtime.
    pub(crate) fn connect(url: Url, reconnect: ReconnectConfig, options: RealtimeOptions) -> Self {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (connections_tx, connections) = watch::channel(0);
        let cancel = CancellationToken::new();

        if options.insecure {
            tracing::warn!("realtime socket verifies TLS certificates even in insecure mode");
        }

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            socket_loop(url, event_tx, connections_tx, reconnect, task_cancel, options).await;
        });

        Self {
            event_rx,
            connections,
            cancel,
        }
    }

    /// Get a new broadcast receiver for the delivery stream.
    ///
    /// If a consumer falls behind it receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RealtimeEvent>> {
        self.event_rx.resubscribe()
    }

    /// Watch the connection epoch: the number of `connected` frames seen
    /// so far. The sender closes when the loop gives up or is cancelled.
    pub fn connections(&self) -> watch::Receiver<u64> {
        self.connections.clone()
    }
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn socket_loop(
    url: Url,
    event_tx: broadcast::Sender<Arc<RealtimeEvent>>,
    connections: watch::Sender<u64>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
    options: RealtimeOptions,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&url, &event_tx, &connections, &cancel, &options) => {
                match result {
                    // Clean disconnect: reset the counter and reconnect immediately.
                    Ok(()) => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        tracing::info!("realtime socket disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "realtime socket error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "realtime reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    tracing::debug!("realtime loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one connection and read frames until it drops.
async fn connect_and_read(
    url: &Url,
    event_tx: &broadcast::Sender<Arc<RealtimeEvent>>,
    connections: &watch::Sender<u64>,
    cancel: &CancellationToken,
    options: &RealtimeOptions,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting realtime socket");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(ref cookie) = options.cookie {
        request = request.with_header("Cookie", cookie.clone());
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("realtime socket connected");

    let (mut write, mut read) = ws_stream.split();

    if let Some(ref session) = options.session {
        let frame = authentication_frame(session);
        write
            .send(tungstenite::Message::Text(frame.into()))
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
    }

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    // The first tick completes immediately.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = write.send(tungstenite::Message::Close(None)).await;
                return Ok(());
            }
            _ = heartbeat.tick() => {
                write
                    .send(tungstenite::Message::Text(PING_FRAME.into()))
                    .await
                    .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
                tracing::trace!("realtime ping sent");
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        handle_frame(&text, event_tx, connections)?;
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "realtime close frame received"
                            );
                        } else {
                            tracing::info!("realtime close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("realtime stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Ping, Pong, Frame: tungstenite answers pings itself
                    }
                }
            }
        }
    }
}

// ── Frame handling ───────────────────────────────────────────────────

const PING_FRAME: &str = r#"{"type":"ping"}"#;

fn authentication_frame(session: &SecretString) -> String {
    serde_json::json!({
        "type": "authentication",
        "data": { "session": session.expose_secret() }
    })
    .to_string()
}

/// Every server frame has the shape `{ "type": "...", "data": ... }`.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ErrorData {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

/// Parse a text frame and broadcast any delivery found inside.
///
/// A `connected` frame bumps the connection epoch. Malformed frames are
/// logged and skipped. Policy-violation errors (code 1008, e.g. a missing
/// project) end the connection so the loop backs off instead of spinning.
fn handle_frame(
    text: &str,
    event_tx: &broadcast::Sender<Arc<RealtimeEvent>>,
    connections: &watch::Sender<u64>,
) -> Result<(), Error> {
    let frame: RawFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse realtime frame");
            return Ok(());
        }
    };

    match frame.kind.as_str() {
        "event" => match serde_json::from_value::<RealtimeEvent>(frame.data) {
            Ok(event) => {
                // No active subscribers right now is not an error.
                let _ = event_tx.send(Arc::new(event));
            }
            Err(e) => tracing::debug!(error = %e, "could not deserialize realtime event"),
        },
        "connected" => {
            connections.send_modify(|epoch| *epoch += 1);
            tracing::debug!(
                data = %frame.data,
                epoch = *connections.borrow(),
                "realtime subscription confirmed"
            );
        }
        "error" => {
            let err: ErrorData = serde_json::from_value(frame.data).unwrap_or(ErrorData {
                code: 0,
                message: "unknown realtime error".into(),
            });
            tracing::warn!(code = err.code, message = %err.message, "realtime error frame");
            if err.code == 1008 {
                return Err(Error::Realtime {
                    code: err.code,
                    message: err.message,
                });
            }
        }
        other => tracing::trace!(kind = other, "realtime frame ignored"),
    }

    Ok(())
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 0.25)`
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(31)).unwrap_or(31);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
