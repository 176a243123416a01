// Wire models for the backend's JSON responses (response format 1.5).
//
// System attributes carry a `$` prefix on the wire (`$id`, `$createdAt`).
// Everything the backend sends beyond the typed fields is kept in a
// flattened map so nothing is silently dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Databases ────────────────────────────────────────────────────────

/// A document from a database collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,

    #[serde(rename = "$collectionId", default)]
    pub collection_id: String,

    #[serde(rename = "$databaseId", default)]
    pub database_id: String,

    #[serde(rename = "$createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "$updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(rename = "$permissions", default)]
    pub permissions: Vec<String>,

    /// User-defined attributes.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Document {
    /// Look up a user-defined attribute.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.data.get(attribute)
    }
}

/// `GET /databases/{db}/collections/{col}/documents` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList<T = Document> {
    pub total: u64,
    pub documents: Vec<T>,
}

// ── Storage ──────────────────────────────────────────────────────────

/// File metadata from a storage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(rename = "$id")]
    pub id: String,

    #[serde(default)]
    pub bucket_id: String,

    #[serde(rename = "$createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "$updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(rename = "$permissions", default)]
    pub permissions: Vec<String>,

    #[serde(default)]
    pub name: String,

    /// MD5 signature of the stored content.
    #[serde(default)]
    pub signature: String,

    #[serde(default)]
    pub mime_type: String,

    /// Size in bytes before compression/encryption.
    #[serde(default)]
    pub size_original: u64,

    #[serde(default)]
    pub chunks_total: u64,

    #[serde(default)]
    pub chunks_uploaded: u64,
}

/// `GET /storage/buckets/{bucket}/files` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileList<T = File> {
    pub total: u64,
    pub files: Vec<T>,
}

// ── Account ──────────────────────────────────────────────────────────

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,

    #[serde(rename = "$createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "$updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub status: bool,

    #[serde(default)]
    pub email_verification: bool,

    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub prefs: Map<String, Value>,

    /// All remaining fields the backend sends.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A login session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,

    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub expire: Option<DateTime<Utc>>,

    #[serde(default)]
    pub provider: String,

    #[serde(default)]
    pub current: bool,

    /// Only populated when the session is created with a server key.
    #[serde(default, skip_serializing)]
    pub secret: String,
}

// ── Realtime ─────────────────────────────────────────────────────────

/// One realtime delivery: the events that fired plus the affected record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    /// Event patterns that matched, e.g.
    /// `"databases.*.collections.*.documents.*.create"`.
    #[serde(default)]
    pub events: Vec<String>,

    /// Channels this delivery was routed through.
    #[serde(default)]
    pub channels: Vec<String>,

    /// Server timestamp (string on current servers, epoch on older ones).
    #[serde(default)]
    pub timestamp: Option<Value>,

    /// The affected record.
    #[serde(default)]
    pub payload: Value,
}
