use bytes::Bytes;
use futures_util::future::BoxFuture;
use livewrite_api::RealtimeEvent;
use url::Url;

use super::live::{Live, LiveSource, Phase};
use crate::error::CoreError;
use crate::facade::Facade;
use crate::store::{LoadState, StoreStream};

/// One file's download URL and content.
///
/// The URL is known as soon as the wrapper exists; the content is
/// downloaded once in the background. No realtime subscription is opened.
pub struct BucketFile {
    bucket_id: String,
    file_id: String,
    url: Url,
    live: Live<Bytes>,
}

impl BucketFile {
    /// Resolve the download URL and start downloading.
    ///
    /// Fails only if the URL cannot be built. Must be called from within
    /// a Tokio runtime.
    pub fn open(
        facade: &Facade,
        bucket_id: impl Into<String>,
        file_id: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let bucket_id = bucket_id.into();
        let file_id = file_id.into();
        let url = facade.storage().file_download_url(&bucket_id, &file_id)?;

        let source = FileSource {
            facade: facade.clone(),
            bucket_id: bucket_id.clone(),
            file_id: file_id.clone(),
        };

        Ok(Self {
            bucket_id,
            file_id,
            url,
            live: Live::spawn(source, None),
        })
    }

    /// The download URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The downloaded content, once available.
    pub fn file(&self) -> Option<Bytes> {
        self.live.loaded()
    }

    pub fn state(&self) -> LoadState<Bytes> {
        self.live.state()
    }

    pub fn subscribe(&self) -> StoreStream<LoadState<Bytes>> {
        self.live.subscribe()
    }

    /// Wait for the download to finish.
    pub async fn ready(&self) -> Result<Bytes, CoreError> {
        self.live.ready().await.map_err(|e| match e {
            CoreError::LoadFailed { message, .. } => CoreError::FileDownload {
                bucket_id: self.bucket_id.clone(),
                file_id: self.file_id.clone(),
                message,
            },
            other => other,
        })
    }

    /// Abort a download in progress.
    pub async fn close(self) {
        self.live.close().await;
    }
}

struct FileSource {
    facade: Facade,
    bucket_id: String,
    file_id: String,
}

impl LiveSource for FileSource {
    type Snapshot = Bytes;

    fn resource(&self) -> String {
        format!("file {}/{}", self.bucket_id, self.file_id)
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Bytes, CoreError>> {
        self.facade.storage().download(&self.bucket_id, &self.file_id)
    }

    fn apply(&self, _snapshot: &mut Bytes, _event: &RealtimeEvent, _phase: Phase) -> bool {
        false
    }

    fn failure_message(&self, error: &CoreError) -> String {
        format!("Could not load file: {error}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, facade};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn url_is_available_immediately() {
        let backend = Arc::new(MockBackend::new());
        backend.put_blob("avatars", "f1", Bytes::from_static(b"png"));

        let file = BucketFile::open(&facade(&backend), "avatars", "f1").unwrap();
        assert!(file.url().path().ends_with("/storage/buckets/avatars/files/f1/download"));
        assert!(file.file().is_none());

        let bytes = file.ready().await.unwrap();
        assert_eq!(bytes.as_ref(), b"png");
        assert_eq!(file.file().unwrap(), Bytes::from_static(b"png"));
        assert_eq!(backend.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn download_failure_is_file_error() {
        let backend = Arc::new(MockBackend::new());
        let file = BucketFile::open(&facade(&backend), "avatars", "missing").unwrap();

        let err = file.ready().await.unwrap_err();
        match err {
            CoreError::FileDownload {
                bucket_id,
                file_id,
                message,
            } => {
                assert_eq!(bucket_id, "avatars");
                assert_eq!(file_id, "missing");
                assert!(message.starts_with("Could not load file"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(file.state().error().unwrap().starts_with("Could not load file"));
    }
}
