// In-memory backend for wrapper tests.
//
// Serves documents, pages, blobs, and the account from maps, and routes
// emitted deliveries to every open subscription whose channels overlap
// the delivery's channels, like the realtime server does. Subscriptions
// start out connected unless the backend holds connections back.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use livewrite_api::RealtimeEvent;
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use url::Url;

use crate::error::CoreError;
use crate::facade::Facade;
use crate::service::{
    AccountService, DatabaseService, RealtimeService, RealtimeSubscription, RecordPage,
    StorageService,
};
use crate::wrapper::live::Live;

const WAIT: Duration = Duration::from_secs(5);

struct MockSubscription {
    channels: Vec<String>,
    events: broadcast::Sender<Arc<RealtimeEvent>>,
    connections: watch::Sender<u64>,
}

pub(crate) struct MockBackend {
    capacity: usize,
    connect_on_subscribe: bool,
    documents: Mutex<HashMap<String, Value>>,
    pages: Mutex<HashMap<String, RecordPage>>,
    blobs: Mutex<HashMap<String, Bytes>>,
    user: Mutex<Option<Value>>,
    subscriptions: Mutex<Vec<MockSubscription>>,
    calls: Mutex<Vec<String>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Per-subscription buffer size; small values force lag.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            connect_on_subscribe: true,
            documents: Mutex::default(),
            pages: Mutex::default(),
            blobs: Mutex::default(),
            user: Mutex::default(),
            subscriptions: Mutex::default(),
            calls: Mutex::default(),
        }
    }

    /// Subscriptions stay unconfirmed until [`connect_all`](Self::connect_all).
    pub(crate) fn with_pending_connections() -> Self {
        Self {
            connect_on_subscribe: false,
            ..Self::new()
        }
    }

    // ── Seeding ──────────────────────────────────────────────────────

    pub(crate) fn put_document(&self, document_id: &str, value: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert(document_id.to_owned(), value);
    }

    /// `key` is `databases/{db}/collections/{col}` or `buckets/{bucket}`.
    pub(crate) fn put_page(&self, key: &str, total: i64, items: Vec<Value>) {
        self.pages
            .lock()
            .unwrap()
            .insert(key.to_owned(), RecordPage { total, items });
    }

    pub(crate) fn put_blob(&self, bucket_id: &str, file_id: &str, bytes: Bytes) {
        self.blobs
            .lock()
            .unwrap()
            .insert(format!("{bucket_id}/{file_id}"), bytes);
    }

    pub(crate) fn set_user(&self, user: Value) {
        *self.user.lock().unwrap() = Some(user);
    }

    // ── Realtime ─────────────────────────────────────────────────────

    /// Deliver `payload` to subscriptions listening on `channel`.
    pub(crate) fn emit(&self, channel: &str, events: &[&str], payload: Value) {
        self.deliver(RealtimeEvent {
            events: events.iter().map(|e| (*e).to_owned()).collect(),
            channels: vec![channel.to_owned()],
            timestamp: None,
            payload,
        });
    }

    /// A document delivery in `main/posts`, shaped like the server's.
    pub(crate) fn emit_document(&self, action: &str, payload: Value) {
        let id = payload["$id"].as_str().unwrap_or_default().to_owned();
        self.deliver(RealtimeEvent {
            events: vec![
                format!("databases.main.collections.posts.documents.{id}.{action}"),
                format!("databases.*.collections.*.documents.*.{action}"),
                "databases.*.collections.*.documents.*".to_owned(),
                "databases.*".to_owned(),
            ],
            channels: vec![
                "documents".to_owned(),
                "databases.main.collections.posts.documents".to_owned(),
                format!("databases.main.collections.posts.documents.{id}"),
            ],
            timestamp: None,
            payload,
        });
    }

    /// A file delivery in bucket `avatars`.
    pub(crate) fn emit_file(&self, action: &str, payload: Value) {
        let id = payload["$id"].as_str().unwrap_or_default().to_owned();
        self.deliver(RealtimeEvent {
            events: vec![
                format!("buckets.avatars.files.{id}.{action}"),
                format!("buckets.*.files.*.{action}"),
                "buckets.*.files.*".to_owned(),
                "buckets.*".to_owned(),
            ],
            channels: vec![
                "files".to_owned(),
                "buckets.avatars.files".to_owned(),
                format!("buckets.avatars.files.{id}"),
            ],
            timestamp: None,
            payload,
        });
    }

    fn deliver(&self, event: RealtimeEvent) {
        let event = Arc::new(event);
        for sub in self.subscriptions.lock().unwrap().iter() {
            if sub.channels.iter().any(|c| event.channels.contains(c)) {
                let _ = sub.events.send(Arc::clone(&event));
            }
        }
    }

    /// Confirm every subscription's connection, as a fresh `connected`
    /// frame would. On an already connected subscription this is a
    /// reconnection.
    pub(crate) fn connect_all(&self) {
        for sub in self.subscriptions.lock().unwrap().iter() {
            sub.connections.send_modify(|epoch| *epoch += 1);
        }
    }

    /// Subscriptions whose receiver is still alive.
    pub(crate) fn active_subscriptions(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .map(|sub| sub.events.receiver_count())
            .sum()
    }

    pub(crate) async fn wait_for_subscriptions(&self, expected: usize) {
        tokio::time::timeout(WAIT, async {
            while self.active_subscriptions() != expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("subscription count never reached the expected value");
    }

    // ── Call log ─────────────────────────────────────────────────────

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn page(&self, key: &str) -> Result<RecordPage, CoreError> {
        self.pages
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| not_found(key))
    }
}

fn not_found(what: &str) -> CoreError {
    CoreError::NotFound {
        message: format!("{what} could not be found"),
    }
}

impl DatabaseService for MockBackend {
    fn get_document<'a>(
        &'a self,
        database_id: &'a str,
        collection_id: &'a str,
        document_id: &'a str,
        _queries: &'a [String],
    ) -> BoxFuture<'a, Result<Value, CoreError>> {
        self.record(format!(
            "get_document:{database_id}/{collection_id}/{document_id}"
        ));
        let result = self
            .documents
            .lock()
            .unwrap()
            .get(document_id)
            .cloned()
            .ok_or_else(|| not_found(document_id));
        Box::pin(async move { result })
    }

    fn list_documents<'a>(
        &'a self,
        database_id: &'a str,
        collection_id: &'a str,
        _queries: &'a [String],
    ) -> BoxFuture<'a, Result<RecordPage, CoreError>> {
        self.record(format!("list_documents:{database_id}/{collection_id}"));
        let result = self.page(&format!(
            "databases/{database_id}/collections/{collection_id}"
        ));
        Box::pin(async move { result })
    }
}

impl StorageService for MockBackend {
    fn list_files<'a>(
        &'a self,
        bucket_id: &'a str,
        _queries: &'a [String],
    ) -> BoxFuture<'a, Result<RecordPage, CoreError>> {
        self.record(format!("list_files:{bucket_id}"));
        let result = self.page(&format!("buckets/{bucket_id}"));
        Box::pin(async move { result })
    }

    fn get_file<'a>(
        &'a self,
        bucket_id: &'a str,
        file_id: &'a str,
    ) -> BoxFuture<'a, Result<Value, CoreError>> {
        self.record(format!("get_file:{bucket_id}/{file_id}"));
        let result = self
            .page(&format!("buckets/{bucket_id}"))
            .and_then(|page| {
                page.items
                    .into_iter()
                    .find(|item| item["$id"] == file_id)
                    .ok_or_else(|| not_found(file_id))
            });
        Box::pin(async move { result })
    }

    fn file_download_url(&self, bucket_id: &str, file_id: &str) -> Result<Url, CoreError> {
        Url::parse(&format!(
            "https://mock.invalid/v1/storage/buckets/{bucket_id}/files/{file_id}/download?project=mock"
        ))
        .map_err(|e| CoreError::Config {
            message: e.to_string(),
        })
    }

    fn download<'a>(
        &'a self,
        bucket_id: &'a str,
        file_id: &'a str,
    ) -> BoxFuture<'a, Result<Bytes, CoreError>> {
        self.record(format!("download:{bucket_id}/{file_id}"));
        let key = format!("{bucket_id}/{file_id}");
        let result = self
            .blobs
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(&key));
        Box::pin(async move { result })
    }
}

impl AccountService for MockBackend {
    fn get(&self) -> BoxFuture<'_, Result<Value, CoreError>> {
        self.record("get_account".into());
        let result = self
            .user
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CoreError::AuthenticationFailed {
                message: "User (role: guests) missing scope (account)".into(),
            });
        Box::pin(async move { result })
    }

    fn login<'a>(
        &'a self,
        email: &'a str,
        _password: &'a SecretString,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        self.record(format!("login:{email}"));
        Box::pin(async { Ok(()) })
    }

    fn logout(&self) -> BoxFuture<'_, Result<(), CoreError>> {
        self.record("logout".into());
        Box::pin(async { Ok(()) })
    }
}

impl RealtimeService for MockBackend {
    fn subscribe(&self, channels: Vec<String>) -> Result<RealtimeSubscription, CoreError> {
        self.record(format!("subscribe:{}", channels.join(",")));
        let (events, receiver) = broadcast::channel(self.capacity);
        let (connections, epoch) = watch::channel(u64::from(self.connect_on_subscribe));
        self.subscriptions.lock().unwrap().push(MockSubscription {
            channels,
            events,
            connections,
        });
        Ok(RealtimeSubscription::new(receiver, epoch))
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

pub(crate) fn facade(backend: &Arc<MockBackend>) -> Facade {
    Facade::builder()
        .backend(Arc::clone(backend))
        .build()
        .unwrap()
}

pub(crate) fn facade_without_realtime(backend: &Arc<MockBackend>) -> Facade {
    Facade::builder()
        .backend(Arc::clone(backend))
        .realtime_enabled(false)
        .build()
        .unwrap()
}

/// Wait (bounded) until the wrapper's loaded snapshot satisfies `predicate`.
pub(crate) async fn eventually<S: Clone + Send + Sync + 'static>(
    live: &Live<S>,
    predicate: impl FnMut(&S) -> bool,
) -> S {
    tokio::time::timeout(WAIT, live.wait_until(predicate))
        .await
        .expect("condition not reached in time")
}

/// Let spawned tasks run whatever is ready.
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
