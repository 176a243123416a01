use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use livewrite_api::RealtimeEvent;
use tracing::debug;

use super::list::{ListState, apply_event};
use super::live::{Live, LiveSource, Phase, open_subscription};
use crate::channel::Channel;
use crate::error::CoreError;
use crate::event::ResourceKind;
use crate::facade::Facade;
use crate::model::{self, Record};
use crate::store::{LoadState, StoreStream};

/// The documents of one collection, kept current from realtime deliveries.
///
/// Only subscribes when the facade has realtime enabled; otherwise the
/// list is a one-shot snapshot.
pub struct Collection<T: Record = model::Document> {
    channel: Channel,
    live: Live<ListState<T>>,
}

impl<T: Record> Collection<T> {
    /// Start loading the documents matching `queries` and listening for
    /// changes. Must be called from within a Tokio runtime.
    pub fn open(
        facade: &Facade,
        database_id: impl Into<String>,
        collection_id: impl Into<String>,
        queries: Vec<String>,
    ) -> Self {
        let source =
            CollectionSource::<T>::new(facade, database_id.into(), collection_id.into(), queries);
        let channel = Channel::collection(&source.database_id, &source.collection_id);

        let subscription = if facade.realtime_enabled() {
            open_subscription(facade, &channel)
        } else {
            debug!(channel = %channel, "realtime disabled, loading snapshot only");
            None
        };

        Self {
            live: Live::spawn(source, subscription),
            channel,
        }
    }

    /// Load one page of documents, without subscribing to the collection.
    pub async fn fetch(
        facade: &Facade,
        database_id: impl Into<String>,
        collection_id: impl Into<String>,
        queries: Vec<String>,
    ) -> Result<ListState<T>, CoreError> {
        CollectionSource::<T>::new(facade, database_id.into(), collection_id.into(), queries)
            .fetch()
            .await
    }

    /// The loaded documents, in list order. Empty until loaded.
    pub fn documents(&self) -> Vec<Arc<T>> {
        self.live
            .with_loaded(|list| list.map(|l| l.items.clone()).unwrap_or_default())
    }

    /// The server-side document count. Zero until loaded.
    pub fn total(&self) -> i64 {
        self.live.with_loaded(|list| list.map_or(0, |l| l.total))
    }

    pub fn state(&self) -> LoadState<ListState<T>> {
        self.live.state()
    }

    pub fn subscribe(&self) -> StoreStream<LoadState<ListState<T>>> {
        self.live.subscribe()
    }

    /// Wait for the initial load.
    pub async fn ready(&self) -> Result<ListState<T>, CoreError> {
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

struct CollectionSource<T> {
    facade: Facade,
    database_id: String,
    collection_id: String,
    queries: Vec<String>,
    _record: PhantomData<fn() -> T>,
}

impl<T> CollectionSource<T> {
    fn new(facade: &Facade, database_id: String, collection_id: String, queries: Vec<String>) -> Self {
        Self {
            facade: facade.clone(),
            database_id,
            collection_id,
            queries,
            _record: PhantomData,
        }
    }
}

impl<T: Record> LiveSource for CollectionSource<T> {
    type Snapshot = ListState<T>;

    fn resource(&self) -> String {
        format!("collection {}/{}", self.database_id, self.collection_id)
    }

    fn fetch(&self) -> BoxFuture<'_, Result<ListState<T>, CoreError>> {
        Box::pin(async move {
            let page = self
                .facade
                .databases()
                .list_documents(&self.database_id, &self.collection_id, &self.queries)
                .await?;
            Ok(ListState::new(model::decode_all(&page.items)?, page.total))
        })
    }

    fn apply(&self, snapshot: &mut ListState<T>, event: &RealtimeEvent, phase: Phase) -> bool {
        apply_event(ResourceKind::Documents, snapshot, event, phase)
    }
}
