// ── Live wrappers ──
//
// Each wrapper loads a snapshot, then keeps it current from realtime
// deliveries on its channel until closed or dropped.

mod account;
mod bucket;
mod bucket_file;
mod collection;
mod document;
mod list;
pub(crate) mod live;

pub use account::Account;
pub use bucket::Bucket;
pub use bucket_file::BucketFile;
pub use collection::Collection;
pub use document::Document;
pub use list::ListState;
