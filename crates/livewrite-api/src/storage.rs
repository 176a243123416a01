// Storage bucket endpoints
//
// Files live under `storage/buckets/{bucket}/files`. Downloads are plain
// byte responses, so the download URL is also exposed for callers that
// want to hand it to something else.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::client::{AppwriteClient, query_params};
use crate::error::Error;
use crate::models::{File, FileList};

impl AppwriteClient {
    /// List files in a bucket.
    ///
    /// `GET /storage/buckets/{bucket}/files`
    pub async fn list_files<T: DeserializeOwned>(
        &self,
        bucket_id: &str,
        queries: &[String],
    ) -> Result<FileList<T>, Error> {
        debug!(bucket_id, "listing files");
        self.get_with_params(
            &format!("storage/buckets/{bucket_id}/files"),
            &query_params(queries),
        )
        .await
    }

    /// Fetch file metadata.
    ///
    /// `GET /storage/buckets/{bucket}/files/{file}`
    pub async fn get_file(&self, bucket_id: &str, file_id: &str) -> Result<File, Error> {
        debug!(bucket_id, file_id, "getting file");
        self.get(&format!("storage/buckets/{bucket_id}/files/{file_id}"))
            .await
    }

    /// The download URL for a file. Pure: no request is made.
    ///
    /// `{endpoint}/storage/buckets/{bucket}/files/{file}/download?project={project}`
    pub fn file_download_url(&self, bucket_id: &str, file_id: &str) -> Result<Url, Error> {
        let mut url = self.url(&format!("storage/buckets/{bucket_id}/files/{file_id}/download"))?;
        url.query_pairs_mut().append_pair("project", self.project());
        Ok(url)
    }

    /// Download a file's content.
    pub async fn download_file(&self, bucket_id: &str, file_id: &str) -> Result<Bytes, Error> {
        let url = self.file_download_url(bucket_id, file_id)?;
        debug!(bucket_id, file_id, "downloading file");
        self.get_bytes(url).await
    }
}
