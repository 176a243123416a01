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

/// The files of one storage bucket, kept current from realtime deliveries.
///
/// Same list semantics as [`Collection`](super::Collection), driven by
/// the bucket file events.
pub struct Bucket<T: Record = model::File> {
    channel: Channel,
    live: Live<ListState<T>>,
}

impl<T: Record> Bucket<T> {
    /// Start loading the files matching `queries` and listening for
    /// changes. Must be called from within a Tokio runtime.
    pub fn open(facade: &Facade, bucket_id: impl Into<String>, queries: Vec<String>) -> Self {
        let source = BucketSource::<T>::new(facade, bucket_id.into(), queries);
        let channel = Channel::bucket(&source.bucket_id);

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

    /// Load one page of files, without subscribing to the bucket.
    pub async fn fetch(
        facade: &Facade,
        bucket_id: impl Into<String>,
        queries: Vec<String>,
    ) -> Result<ListState<T>, CoreError> {
        BucketSource::<T>::new(facade, bucket_id.into(), queries)
            .fetch()
            .await
    }

    /// The loaded files, in list order. Empty until loaded.
    pub fn files(&self) -> Vec<Arc<T>> {
        self.live
            .with_loaded(|list| list.map(|l| l.items.clone()).unwrap_or_default())
    }

    /// The server-side file count. Zero until loaded.
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

struct BucketSource<T> {
    facade: Facade,
    bucket_id: String,
    queries: Vec<String>,
    _record: PhantomData<fn() -> T>,
}

impl<T> BucketSource<T> {
    fn new(facade: &Facade, bucket_id: String, queries: Vec<String>) -> Self {
        Self {
            facade: facade.clone(),
            bucket_id,
            queries,
            _record: PhantomData,
        }
    }
}

impl<T: Record> LiveSource for BucketSource<T> {
    type Snapshot = ListState<T>;

    fn resource(&self) -> String {
        format!("bucket {}", self.bucket_id)
    }

    fn fetch(&self) -> BoxFuture<'_, Result<ListState<T>, CoreError>> {
        Box::pin(async move {
            let page = self
                .facade
                .storage()
                .list_files(&self.bucket_id, &self.queries)
                .await?;
            Ok(ListState::new(model::decode_all(&page.items)?, page.total))
        })
    }

    fn apply(&self, snapshot: &mut ListState<T>, event: &RealtimeEvent, phase: Phase) -> bool {
        apply_event(ResourceKind::Files, snapshot, event, phase)
    }
}
