// Database document endpoints
//
// Documents are addressed as `databases/{db}/collections/{col}/documents/{doc}`.
// List and get calls accept backend query strings as repeated `queries[]`.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::{AppwriteClient, query_params};
use crate::error::Error;
use crate::models::DocumentList;

impl AppwriteClient {
    /// Fetch one document.
    ///
    /// `GET /databases/{db}/collections/{col}/documents/{doc}`
    pub async fn get_document<T: DeserializeOwned>(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        queries: &[String],
    ) -> Result<T, Error> {
        debug!(database_id, collection_id, document_id, "getting document");
        self.get_with_params(
            &format!("databases/{database_id}/collections/{collection_id}/documents/{document_id}"),
            &query_params(queries),
        )
        .await
    }

    /// List documents matching `queries`.
    ///
    /// `GET /databases/{db}/collections/{col}/documents`
    pub async fn list_documents<T: DeserializeOwned>(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[String],
    ) -> Result<DocumentList<T>, Error> {
        debug!(database_id, collection_id, "listing documents");
        self.get_with_params(
            &format!("databases/{database_id}/collections/{collection_id}/documents"),
            &query_params(queries),
        )
        .await
    }
}
