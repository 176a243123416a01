use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use livewrite_api::{AppwriteClient, ReconnectConfig};
use secrecy::SecretString;
use serde_json::Value;
use url::Url;

use super::{
    AccountService, DatabaseService, RealtimeService, RealtimeSubscription, RecordPage,
    StorageService,
};
use crate::error::CoreError;

/// All four services backed by one [`AppwriteClient`].
#[derive(Clone)]
pub struct AppwriteBackend {
    client: Arc<AppwriteClient>,
}

impl AppwriteBackend {
    pub fn new(client: Arc<AppwriteClient>) -> Self {
        Self { client }
    }
}

fn total(raw: u64) -> i64 {
    i64::try_from(raw).unwrap_or(i64::MAX)
}

impl DatabaseService for AppwriteBackend {
    fn get_document<'a>(
        &'a self,
        database_id: &'a str,
        collection_id: &'a str,
        document_id: &'a str,
        queries: &'a [String],
    ) -> BoxFuture<'a, Result<Value, CoreError>> {
        Box::pin(async move {
            Ok(self
                .client
                .get_document(database_id, collection_id, document_id, queries)
                .await?)
        })
    }

    fn list_documents<'a>(
        &'a self,
        database_id: &'a str,
        collection_id: &'a str,
        queries: &'a [String],
    ) -> BoxFuture<'a, Result<RecordPage, CoreError>> {
        Box::pin(async move {
            let list = self
                .client
                .list_documents::<Value>(database_id, collection_id, queries)
                .await?;
            Ok(RecordPage {
                total: total(list.total),
                items: list.documents,
            })
        })
    }
}

impl StorageService for AppwriteBackend {
    fn list_files<'a>(
        &'a self,
        bucket_id: &'a str,
        queries: &'a [String],
    ) -> BoxFuture<'a, Result<RecordPage, CoreError>> {
        Box::pin(async move {
            let list = self.client.list_files::<Value>(bucket_id, queries).await?;
            Ok(RecordPage {
                total: total(list.total),
                items: list.files,
            })
        })
    }

    fn get_file<'a>(
        &'a self,
        bucket_id: &'a str,
        file_id: &'a str,
    ) -> BoxFuture<'a, Result<Value, CoreError>> {
        Box::pin(async move {
            let file = self.client.get_file(bucket_id, file_id).await?;
            Ok(serde_json::to_value(file)?)
        })
    }

    fn file_download_url(&self, bucket_id: &str, file_id: &str) -> Result<Url, CoreError> {
        Ok(self.client.file_download_url(bucket_id, file_id)?)
    }

    fn download<'a>(
        &'a self,
        bucket_id: &'a str,
        file_id: &'a str,
    ) -> BoxFuture<'a, Result<Bytes, CoreError>> {
        Box::pin(async move { Ok(self.client.download_file(bucket_id, file_id).await?) })
    }
}

impl AccountService for AppwriteBackend {
    fn get(&self) -> BoxFuture<'_, Result<Value, CoreError>> {
        Box::pin(async move {
            let user = self.client.get_account().await?;
            Ok(serde_json::to_value(user)?)
        })
    }

    fn login<'a>(
        &'a self,
        email: &'a str,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(async move {
            let session = self
                .client
                .create_email_password_session(email, password)
                .await?;
            tracing::info!(user_id = %session.user_id, "session created");
            Ok(())
        })
    }

    fn logout(&self) -> BoxFuture<'_, Result<(), CoreError>> {
        Box::pin(async move {
            self.client.delete_session("current").await?;
            tracing::info!("session deleted");
            Ok(())
        })
    }
}

impl RealtimeService for AppwriteBackend {
    fn subscribe(&self, channels: Vec<String>) -> Result<RealtimeSubscription, CoreError> {
        let handle = self.client.subscribe(channels, ReconnectConfig::default())?;
        Ok(RealtimeSubscription::from_handle(handle))
    }
}
