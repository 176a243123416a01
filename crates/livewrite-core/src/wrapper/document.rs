use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use livewrite_api::RealtimeEvent;
use tracing::warn;

use super::live::{Live, LiveSource, Phase, open_subscription};
use crate::channel::Channel;
use crate::error::CoreError;
use crate::facade::Facade;
use crate::model::{self, Record};
use crate::store::{LoadState, StoreStream};

/// A single document, kept current from its realtime channel.
///
/// Every delivery on the document's channel replaces the held record,
/// whatever its event kind. A delete delivery therefore leaves the last
/// payload in place rather than clearing it.
pub struct Document<T: Record = model::Document> {
    channel: Channel,
    live: Live<Arc<T>>,
}

impl<T: Record> Document<T> {
    /// Start loading `document_id` and listening for changes.
    ///
    /// Returns immediately; use [`ready`](Self::ready) to await the
    /// initial load. Must be called from within a Tokio runtime.
    pub fn open(
        facade: &Facade,
        database_id: impl Into<String>,
        collection_id: impl Into<String>,
        document_id: impl Into<String>,
        queries: Vec<String>,
    ) -> Self {
        let source = DocumentSource::<T>::new(
            facade,
            database_id.into(),
            collection_id.into(),
            document_id.into(),
            queries,
        );
        let channel = Channel::document(
            &source.database_id,
            &source.collection_id,
            &source.document_id,
        );

        let subscription = open_subscription(facade, &channel);
        Self {
            live: Live::spawn(source, subscription),
            channel,
        }
    }

    /// Load the document once, without subscribing to its channel.
    pub async fn fetch(
        facade: &Facade,
        database_id: impl Into<String>,
        collection_id: impl Into<String>,
        document_id: impl Into<String>,
        queries: Vec<String>,
    ) -> Result<Arc<T>, CoreError> {
        DocumentSource::<T>::new(
            facade,
            database_id.into(),
            collection_id.into(),
            document_id.into(),
            queries,
        )
        .fetch()
        .await
    }

    /// The current record, once loaded.
    pub fn item(&self) -> Option<Arc<T>> {
        self.live.loaded()
    }

    pub fn state(&self) -> LoadState<Arc<T>> {
        self.live.state()
    }

    pub fn subscribe(&self) -> StoreStream<LoadState<Arc<T>>> {
        self.live.subscribe()
    }

    /// Wait for the initial load.
    pub async fn ready(&self) -> Result<Arc<T>, CoreError> {
        self.live.ready().await
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Stop listening and wait for the background task to exit.
    pub async fn close(self) {
        self.live.close().await;
    }
}

struct DocumentSource<T> {
    facade: Facade,
    database_id: String,
    collection_id: String,
    document_id: String,
    queries: Vec<String>,
    _record: PhantomData<fn() -> T>,
}

impl<T> DocumentSource<T> {
    fn new(
        facade: &Facade,
        database_id: String,
        collection_id: String,
        document_id: String,
        queries: Vec<String>,
    ) -> Self {
        Self {
            facade: facade.clone(),
            database_id,
            collection_id,
            document_id,
            queries,
            _record: PhantomData,
        }
    }
}

impl<T: Record> LiveSource for DocumentSource<T> {
    type Snapshot = Arc<T>;

    fn resource(&self) -> String {
        format!(
            "document {}/{}/{}",
            self.database_id, self.collection_id, self.document_id
        )
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Arc<T>, CoreError>> {
        Box::pin(async move {
            let raw = self
                .facade
                .databases()
                .get_document(
                    &self.database_id,
                    &self.collection_id,
                    &self.document_id,
                    &self.queries,
                )
                .await?;
            Ok(Arc::new(model::decode(&raw)?))
        })
    }

    fn apply(&self, snapshot: &mut Arc<T>, event: &RealtimeEvent, _phase: Phase) -> bool {
        match model::decode::<T>(&event.payload) {
            Ok(item) => {
                *snapshot = Arc::new(item);
                true
            }
            Err(e) => {
                warn!(document_id = %self.document_id, error = %e, "could not decode delivery payload");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, eventually, facade};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn seeded() -> Arc<MockBackend> {
        let backend = Arc::new(MockBackend::new());
        backend.put_document("d1", json!({ "$id": "d1", "title": "first" }));
        backend
    }

    #[tokio::test]
    async fn loads_initial_document() {
        let backend = seeded();
        let doc = Document::<Value>::open(&facade(&backend), "main", "posts", "d1", vec![]);

        let item = doc.ready().await.unwrap();
        assert_eq!(item["title"], "first");
        assert_eq!(doc.item().unwrap()["title"], "first");
        assert_eq!(
            doc.channel().topic(),
            "databases.main.collections.posts.documents.d1"
        );
    }

    #[tokio::test]
    async fn fetch_reads_without_subscribing() {
        let backend = seeded();
        let shared = facade(&backend);

        let item = Document::<Value>::fetch(&shared, "main", "posts", "d1", vec![])
            .await
            .unwrap();
        assert_eq!(item["title"], "first");

        let err = Document::<Value>::fetch(&shared, "main", "posts", "nope", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }), "got {err:?}");
        assert_eq!(backend.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn subscribes_before_fetching() {
        let backend = seeded();
        let doc = Document::<Value>::open(&facade(&backend), "main", "posts", "d1", vec![]);
        doc.ready().await.unwrap();

        assert_eq!(
            backend.calls(),
            vec![
                "subscribe:databases.main.collections.posts.documents.d1",
                "get_document:main/posts/d1",
            ]
        );
    }

    #[tokio::test]
    async fn any_delivery_replaces_item() {
        let backend = seeded();
        let doc = Document::<Value>::open(&facade(&backend), "main", "posts", "d1", vec![]);
        doc.ready().await.unwrap();

        backend.emit_document("update", json!({ "$id": "d1", "title": "second" }));
        eventually(&doc.live, |item| item["title"] == "second").await;

        // Deletes replace too: the item is not cleared.
        backend.emit_document("delete", json!({ "$id": "d1", "title": "deleted payload" }));
        let item = eventually(&doc.live, |item| item["title"] == "deleted payload").await;
        assert_eq!(item["$id"], "d1");
        assert!(doc.state().is_loaded());
    }

    #[tokio::test]
    async fn delivery_during_fetch_wins_over_snapshot() {
        let backend = seeded();
        let doc = Document::<Value>::open(&facade(&backend), "main", "posts", "d1", vec![]);

        // Emitted before the task has run: buffered, then replayed.
        backend.emit_document("update", json!({ "$id": "d1", "title": "newer" }));

        let item = doc.ready().await.unwrap();
        assert_eq!(item["title"], "newer");
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_not_thrown() {
        let backend = Arc::new(MockBackend::new());
        let doc = Document::<Value>::open(&facade(&backend), "main", "posts", "missing", vec![]);

        let err = doc.ready().await.unwrap_err();
        assert!(
            matches!(err, CoreError::LoadFailed { ref resource, .. } if resource.contains("missing")),
            "unexpected error: {err:?}"
        );
        assert!(doc.item().is_none());
        assert!(doc.state().error().is_some());
    }

    #[tokio::test]
    async fn not_gated_by_realtime_switch() {
        let backend = seeded();
        let gated = crate::testing::facade_without_realtime(&backend);
        let doc = Document::<Value>::open(&gated, "main", "posts", "d1", vec![]);
        doc.ready().await.unwrap();

        assert_eq!(backend.active_subscriptions(), 1);
    }

    #[tokio::test]
    async fn close_releases_subscription() {
        let backend = seeded();
        let doc = Document::<Value>::open(&facade(&backend), "main", "posts", "d1", vec![]);
        doc.ready().await.unwrap();
        assert_eq!(backend.active_subscriptions(), 1);

        doc.close().await;
        assert_eq!(backend.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn typed_documents_decode() {
        let backend = seeded();
        let doc = Document::<crate::model::Document>::open(
            &facade(&backend),
            "main",
            "posts",
            "d1",
            vec![],
        );
        let item = doc.ready().await.unwrap();
        assert_eq!(item.id, "d1");
        assert_eq!(item.get("title"), Some(&json!("first")));
    }
}
