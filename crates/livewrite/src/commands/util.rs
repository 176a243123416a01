//! Shared helpers for command handlers.

use chrono::{DateTime, Utc};
use livewrite_core::{LoadState, StoreStream};
use tracing::debug;

use crate::error::CliError;

/// Print every loaded state of a live view until Ctrl-C.
///
/// The current state is printed first if it is already loaded. A failed
/// load ends the watch with an error; the view closing ends it cleanly.
pub async fn watch<S>(
    resource: &str,
    mut stream: StoreStream<LoadState<S>>,
    mut print: impl FnMut(&S) -> Result<(), CliError>,
) -> Result<(), CliError>
where
    S: Clone + Send + Sync + 'static,
{
    let mut state = stream.current().clone();

    loop {
        match state {
            LoadState::Pending => {}
            LoadState::Loaded(ref snapshot) => print(snapshot)?,
            LoadState::Failed(message) => {
                return Err(CliError::LoadFailed {
                    resource: resource.to_owned(),
                    message,
                });
            }
        }

        let next = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!(resource, "interrupted, stopping watch");
                return Ok(());
            }
            next = stream.changed() => next,
        };

        match next {
            Some(next) => state = next,
            None => return Ok(()),
        }
    }
}

/// Human-readable timestamp for table output.
pub fn timestamp(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
