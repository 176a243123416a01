// livewrite-api: Async Rust client for Appwrite-style databases, storage, account, and realtime

pub mod account;
pub mod auth;
pub mod client;
pub mod databases;
pub mod error;
pub mod models;
pub mod realtime;
pub mod storage;
pub mod transport;

pub use auth::Credentials;
pub use client::AppwriteClient;
pub use error::Error;
pub use models::{Document, DocumentList, File, FileList, RealtimeEvent, Session, User};
pub use realtime::{RealtimeHandle, ReconnectConfig};
pub use transport::{TlsMode, TransportConfig};
