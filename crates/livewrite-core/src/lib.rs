// livewrite-core: Observable, self-updating views over an Appwrite-style backend.
//
// A `Facade` bundles the backend services. Wrappers (`Document`,
// `Collection`, `Bucket`, `BucketFile`, `Account`) fetch a snapshot
// through it, subscribe to the matching realtime channel, and publish
// every change through a `Store`.

pub mod channel;
pub mod config;
pub mod error;
pub mod event;
pub mod facade;
pub mod model;
pub mod service;
pub mod store;
pub mod wrapper;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use channel::Channel;
pub use config::{AuthCredentials, FacadeConfig, TlsVerification};
pub use error::CoreError;
pub use event::{AppwriteEvent, EventKind, ResourceKind, classify};
pub use facade::{Facade, FacadeBuilder};
pub use model::Record;
pub use service::{
    AccountService, AppwriteBackend, DatabaseService, RealtimeService, RealtimeSubscription,
    RecordPage, StorageService,
};
pub use store::{LoadState, Store, StoreStream};
pub use wrapper::{Account, Bucket, BucketFile, Collection, Document, ListState};
