// ── Observable state ──
//
// Every wrapper publishes its state through a `Store`: a single-writer,
// many-reader cell backed by `tokio::sync::watch`. Readers either take
// snapshots or await changes through a `StoreStream`.

mod load_state;
mod observable;

pub use load_state::LoadState;
pub use observable::{Store, StoreStream, StoreWatchStream};
