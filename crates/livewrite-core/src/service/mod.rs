// ── Backend service seams ──
//
// Wrappers talk to the backend only through these object-safe traits,
// held by the `Facade` as `Arc<dyn …>`. `AppwriteBackend` implements all
// four on top of `livewrite_api`; tests plug in an in-memory backend.
//
// Payloads cross this boundary as raw JSON so the traits stay
// non-generic; wrappers decode into their record type.

mod appwrite;

use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use livewrite_api::{RealtimeEvent, RealtimeHandle};
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use url::Url;

use crate::error::CoreError;

pub use appwrite::AppwriteBackend;

/// One page of a list call: the server-side total plus raw payloads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPage {
    pub total: i64,
    pub items: Vec<Value>,
}

/// Document reads.
pub trait DatabaseService: Send + Sync {
    fn get_document<'a>(
        &'a self,
        database_id: &'a str,
        collection_id: &'a str,
        document_id: &'a str,
        queries: &'a [String],
    ) -> BoxFuture<'a, Result<Value, CoreError>>;

    fn list_documents<'a>(
        &'a self,
        database_id: &'a str,
        collection_id: &'a str,
        queries: &'a [String],
    ) -> BoxFuture<'a, Result<RecordPage, CoreError>>;
}

/// Bucket listings and file content.
pub trait StorageService: Send + Sync {
    fn list_files<'a>(
        &'a self,
        bucket_id: &'a str,
        queries: &'a [String],
    ) -> BoxFuture<'a, Result<RecordPage, CoreError>>;

    /// File metadata.
    fn get_file<'a>(
        &'a self,
        bucket_id: &'a str,
        file_id: &'a str,
    ) -> BoxFuture<'a, Result<Value, CoreError>>;

    /// Download URL for a file. Computed locally, no I/O.
    fn file_download_url(&self, bucket_id: &str, file_id: &str) -> Result<Url, CoreError>;

    fn download<'a>(
        &'a self,
        bucket_id: &'a str,
        file_id: &'a str,
    ) -> BoxFuture<'a, Result<Bytes, CoreError>>;
}

/// The authenticated account and session management.
pub trait AccountService: Send + Sync {
    fn get(&self) -> BoxFuture<'_, Result<Value, CoreError>>;

    fn login<'a>(
        &'a self,
        email: &'a str,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<(), CoreError>>;

    fn logout(&self) -> BoxFuture<'_, Result<(), CoreError>>;
}

/// Realtime subscriptions.
pub trait RealtimeService: Send + Sync {
    /// Open a subscription for `channels`.
    ///
    /// Returns before the server has necessarily registered the channels;
    /// await [`RealtimeSubscription::connected`] for that.
    fn subscribe(&self, channels: Vec<String>) -> Result<RealtimeSubscription, CoreError>;
}

/// Why [`RealtimeSubscription::recv`] returned without a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecvError {
    /// The receiver fell behind and `n` deliveries were dropped.
    #[error("realtime receiver lagged by {0} deliveries")]
    Lagged(u64),

    /// The connection was re-established; deliveries sent while it was
    /// down were never seen.
    #[error("realtime connection re-established")]
    Reconnected,

    #[error("realtime subscription closed")]
    Closed,
}

impl From<broadcast::error::RecvError> for RecvError {
    fn from(e: broadcast::error::RecvError) -> Self {
        match e {
            broadcast::error::RecvError::Lagged(n) => Self::Lagged(n),
            broadcast::error::RecvError::Closed => Self::Closed,
        }
    }
}

/// A live realtime subscription.
///
/// Pairs the delivery stream with the connection epoch: the number of
/// times the server has confirmed the channels. Dropping it releases the
/// underlying connection.
pub struct RealtimeSubscription {
    receiver: broadcast::Receiver<Arc<RealtimeEvent>>,
    connections: watch::Receiver<u64>,
    connection_lost: bool,
    _connection: Option<RealtimeHandle>,
}

impl RealtimeSubscription {
    /// Wrap a receiver and its connection epoch (no socket to keep alive).
    pub fn new(
        receiver: broadcast::Receiver<Arc<RealtimeEvent>>,
        connections: watch::Receiver<u64>,
    ) -> Self {
        Self {
            receiver,
            connections,
            connection_lost: false,
            _connection: None,
        }
    }

    /// Wrap a socket handle; the socket closes when the subscription drops.
    pub fn from_handle(handle: RealtimeHandle) -> Self {
        Self {
            receiver: handle.subscribe(),
            connections: handle.connections(),
            connection_lost: false,
            _connection: Some(handle),
        }
    }

    /// Wait until the server has registered the channels at least once.
    ///
    /// Marks the current epoch as seen, so only later reconnections show
    /// up as [`RecvError::Reconnected`].
    pub async fn connected(&mut self) {
        if self.connections.wait_for(|epoch| *epoch > 0).await.is_err() {
            // The connection was given up; recv reports the closure.
            self.connection_lost = true;
        }
    }

    /// Wait for the next delivery or an unseen reconnection.
    pub async fn recv(&mut self) -> Result<Arc<RealtimeEvent>, RecvError> {
        if !self.connection_lost {
            let reconnected = tokio::select! {
                biased;
                delivery = self.receiver.recv() => return delivery.map_err(RecvError::from),
                changed = self.connections.changed() => changed.is_ok(),
            };
            if reconnected {
                return Err(RecvError::Reconnected);
            }
            self.connection_lost = true;
        }
        self.receiver.recv().await.map_err(RecvError::from)
    }

    /// Take a delivery that is already queued, without waiting.
    ///
    /// `Ok(None)` means nothing is queued.
    pub fn try_recv(&mut self) -> Result<Option<Arc<RealtimeEvent>>, RecvError> {
        if !self.connection_lost && self.connections.has_changed().unwrap_or(false) {
            self.connections.mark_unchanged();
            return Err(RecvError::Reconnected);
        }
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(RecvError::Lagged(n)),
            Err(broadcast::error::TryRecvError::Closed) => Err(RecvError::Closed),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(id: &str) -> Arc<RealtimeEvent> {
        Arc::new(RealtimeEvent {
            events: vec![format!("databases.*.collections.*.documents.{id}.create")],
            channels: vec!["documents".into()],
            timestamp: None,
            payload: json!({ "$id": id }),
        })
    }

    #[tokio::test]
    async fn reconnection_is_reported_once() {
        let (events, receiver) = broadcast::channel(8);
        let (epoch, connections) = watch::channel(0);
        let mut subscription = RealtimeSubscription::new(receiver, connections);

        epoch.send_replace(1);
        subscription.connected().await;
        assert_eq!(subscription.try_recv().unwrap(), None);

        events.send(event("a")).unwrap();
        assert_eq!(subscription.recv().await.unwrap().payload["$id"], "a");

        epoch.send_replace(2);
        assert_eq!(subscription.recv().await.unwrap_err(), RecvError::Reconnected);

        events.send(event("b")).unwrap();
        assert_eq!(subscription.recv().await.unwrap().payload["$id"], "b");
    }

    #[tokio::test]
    async fn try_recv_reports_pending_reconnection() {
        let (_events, receiver) = broadcast::channel(8);
        let (epoch, connections) = watch::channel(1);
        let mut subscription = RealtimeSubscription::new(receiver, connections);
        subscription.connected().await;

        epoch.send_replace(2);
        assert_eq!(subscription.try_recv().unwrap_err(), RecvError::Reconnected);
        assert_eq!(subscription.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn closes_after_connection_is_given_up() {
        let (events, receiver) = broadcast::channel::<Arc<RealtimeEvent>>(8);
        let (epoch, connections) = watch::channel(1);
        let mut subscription = RealtimeSubscription::new(receiver, connections);

        drop(epoch);
        drop(events);
        assert_eq!(subscription.recv().await.unwrap_err(), RecvError::Closed);
    }
}
