// ── Live wrapper driver ──
//
// Every wrapper runs one background task with the same shape:
//
//   subscribe → fetch (buffering deliveries) → replay buffer → live loop
//
// The subscription is opened before the task is spawned, and the fetch
// waits (bounded) until the server confirms the channels, so nothing
// committed after that point can be missed. Deliveries that arrive while
// the fetch is in flight are replayed against the snapshot with
// de-duplicating semantics; afterwards they are applied as they come.
// A lagging receiver or a re-established connection triggers the same
// load sequence again.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use livewrite_api::RealtimeEvent;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, warn};

use crate::channel::Channel;
use crate::error::CoreError;
use crate::facade::Facade;
use crate::service::{RealtimeSubscription, RecvError};
use crate::store::{LoadState, Store, StoreStream};

/// How long the initial load waits for the realtime connection. A later
/// confirmation still triggers a resync.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// When a delivery is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Buffered during the initial fetch; the snapshot may already
    /// reflect it.
    Replay,
    /// Arrived after the snapshot was published.
    Live,
}

/// What a wrapper loads and how deliveries change it.
pub(crate) trait LiveSource: Send + Sync + 'static {
    type Snapshot: Clone + Send + Sync + 'static;

    /// Human-readable name for logs and errors.
    fn resource(&self) -> String;

    fn fetch(&self) -> BoxFuture<'_, Result<Self::Snapshot, CoreError>>;

    /// Apply one delivery. Returns `true` if the snapshot changed.
    fn apply(&self, snapshot: &mut Self::Snapshot, event: &RealtimeEvent, phase: Phase) -> bool;

    /// Reason stored in [`LoadState::Failed`].
    fn failure_message(&self, error: &CoreError) -> String {
        error.to_string()
    }
}

/// Open a subscription for `channel`, logging instead of failing.
///
/// A wrapper whose subscription cannot be opened still loads; it just
/// never updates.
pub(crate) fn open_subscription(facade: &Facade, channel: &Channel) -> Option<RealtimeSubscription> {
    match facade.realtime().subscribe(vec![channel.topic()]) {
        Ok(subscription) => {
            debug!(channel = %channel, "realtime subscription opened");
            Some(subscription)
        }
        Err(e) => {
            warn!(channel = %channel, error = %e, "realtime subscription failed, no live updates");
            None
        }
    }
}

// ── Live handle ──────────────────────────────────────────────────────

/// A wrapper's published state plus its background task.
///
/// Dropping it cancels the task, which releases the subscription.
pub(crate) struct Live<S> {
    resource: String,
    store: Store<LoadState<S>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    _guard: DropGuard,
}

impl<S: Clone + Send + Sync + 'static> Live<S> {
    pub(crate) fn spawn<L>(source: L, subscription: Option<RealtimeSubscription>) -> Self
    where
        L: LiveSource<Snapshot = S>,
    {
        let resource = source.resource();
        let store = Store::new(LoadState::Pending);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(source, store.clone(), subscription, cancel.clone()));

        Self {
            resource,
            store,
            _guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    pub(crate) fn state(&self) -> LoadState<S> {
        self.store.get()
    }

    pub(crate) fn loaded(&self) -> Option<S> {
        self.store.with(|state| state.loaded().cloned())
    }

    pub(crate) fn with_loaded<R>(&self, f: impl FnOnce(Option<&S>) -> R) -> R {
        self.store.with(|state| f(state.loaded()))
    }

    pub(crate) fn subscribe(&self) -> StoreStream<LoadState<S>> {
        self.store.subscribe()
    }

    /// Wait for the initial load to settle.
    pub(crate) async fn ready(&self) -> Result<S, CoreError> {
        match self.store.wait_for(|state| !state.is_pending()).await {
            LoadState::Loaded(value) => Ok(value),
            LoadState::Failed(message) => Err(CoreError::LoadFailed {
                resource: self.resource.clone(),
                message,
            }),
            LoadState::Pending => Err(CoreError::Closed),
        }
    }

    /// Wait until a loaded snapshot satisfies `predicate`.
    #[cfg(test)]
    pub(crate) async fn wait_until(&self, mut predicate: impl FnMut(&S) -> bool) -> S {
        let state = self
            .store
            .wait_for(|state| state.loaded().is_some_and(&mut predicate))
            .await;
        match state {
            LoadState::Loaded(value) => value,
            LoadState::Pending | LoadState::Failed(_) => unreachable!("only loaded states match"),
        }
    }

    /// Cancel the task and wait for it to finish.
    pub(crate) async fn close(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                error!(resource = %self.resource, "live wrapper task panicked");
            }
        }
    }
}

// ── Task body ────────────────────────────────────────────────────────

/// Settles a still-pending store when the task unwinds, so `ready()`
/// does not wait forever.
struct PanicGuard<S: Clone + Send + Sync + 'static> {
    store: Store<LoadState<S>>,
}

impl<S: Clone + Send + Sync + 'static> Drop for PanicGuard<S> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }
        self.store.update_if(|state| {
            if !state.is_pending() {
                return false;
            }
            *state = LoadState::Failed("background task panicked".into());
            true
        });
    }
}

async fn run<L: LiveSource>(
    source: L,
    store: Store<LoadState<L::Snapshot>>,
    mut subscription: Option<RealtimeSubscription>,
    cancel: CancellationToken,
) {
    let resource = source.resource();
    let _guard = PanicGuard {
        store: store.clone(),
    };

    let Some(initial) = load(&source, &mut subscription, &cancel).await else {
        debug!(resource = %resource, "closed before initial load finished");
        return;
    };

    match initial {
        Ok(snapshot) => {
            debug!(resource = %resource, "initial load complete");
            store.set(LoadState::Loaded(snapshot));
        }
        Err(e) => {
            error!(resource = %resource, error = %e, "initial load failed");
            store.set(LoadState::Failed(source.failure_message(&e)));
            return;
        }
    }

    loop {
        let Some(live) = subscription.as_mut() else {
            break;
        };

        let delivery = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            delivery = live.recv() => delivery,
        };

        match delivery {
            Ok(event) => {
                store.update_if(|state| {
                    state
                        .loaded_mut()
                        .is_some_and(|snapshot| source.apply(snapshot, &event, Phase::Live))
                });
            }
            Err(gap @ (RecvError::Lagged(_) | RecvError::Reconnected)) => {
                warn!(resource = %resource, reason = %gap, "realtime deliveries may be missing, resyncing");
                match load(&source, &mut subscription, &cancel).await {
                    None => break,
                    Some(Ok(snapshot)) => store.set(LoadState::Loaded(snapshot)),
                    Some(Err(e)) => {
                        warn!(resource = %resource, error = %e, "resync failed, keeping stale state");
                    }
                }
            }
            Err(RecvError::Closed) => {
                debug!(resource = %resource, "realtime subscription ended");
                subscription = None;
            }
        }
    }

    debug!(resource = %resource, "live wrapper stopped");
}

/// Fetch a snapshot while buffering deliveries, then replay the buffer.
///
/// Waits for the realtime connection first. Returns `None` if
/// cancelled. Restarts the fetch if deliveries were dropped or the
/// connection was re-established while it was in flight.
async fn load<L: LiveSource>(
    source: &L,
    subscription: &mut Option<RealtimeSubscription>,
    cancel: &CancellationToken,
) -> Option<Result<L::Snapshot, CoreError>> {
    if let Some(live) = subscription.as_mut() {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            connected = tokio::time::timeout(CONNECT_TIMEOUT, live.connected()) => {
                if connected.is_err() {
                    warn!(resource = %source.resource(), "realtime not connected yet, loading without it");
                }
            }
        }
    }

    loop {
        let mut buffered: Vec<Arc<RealtimeEvent>> = Vec::new();
        let mut lagged = false;
        let mut fetch = source.fetch();

        let result = loop {
            let mut closed = false;

            tokio::select! {
                biased;
                () = cancel.cancelled() => return None,
                result = &mut fetch => break result,
                delivery = next_delivery(subscription) => match delivery {
                    Ok(event) => buffered.push(event),
                    Err(RecvError::Lagged(_) | RecvError::Reconnected) => lagged = true,
                    Err(RecvError::Closed) => closed = true,
                },
            }

            if closed {
                debug!(resource = %source.resource(), "realtime subscription ended during load");
                *subscription = None;
            }
        };

        // Anything already queued when the fetch returned may or may not
        // be reflected in it.
        if let Some(live) = subscription.as_mut() {
            loop {
                match live.try_recv() {
                    Ok(Some(event)) => buffered.push(event),
                    Ok(None) | Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(_) | RecvError::Reconnected) => lagged = true,
                }
            }
        }

        let mut snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => return Some(Err(e)),
        };

        if lagged {
            debug!(resource = %source.resource(), "deliveries missed during load, fetching again");
            continue;
        }

        if !buffered.is_empty() {
            debug!(
                resource = %source.resource(),
                count = buffered.len(),
                "replaying buffered deliveries"
            );
        }
        for event in &buffered {
            source.apply(&mut snapshot, event, Phase::Replay);
        }

        return Some(Ok(snapshot));
    }
}

async fn next_delivery(
    subscription: &mut Option<RealtimeSubscription>,
) -> Result<Arc<RealtimeEvent>, RecvError> {
    match subscription {
        Some(live) => live.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Panicking;

    impl LiveSource for Panicking {
        type Snapshot = u32;

        fn resource(&self) -> String {
            "panicking".into()
        }

        fn fetch(&self) -> BoxFuture<'_, Result<u32, CoreError>> {
            Box::pin(async {
                let snapshot: Option<u32> = None;
                Ok(snapshot.unwrap())
            })
        }

        fn apply(&self, _snapshot: &mut u32, _event: &RealtimeEvent, _phase: Phase) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn panicking_task_fails_ready() {
        let live = Live::spawn(Panicking, None);

        let err = tokio::time::timeout(Duration::from_secs(5), live.ready())
            .await
            .unwrap()
            .unwrap_err();

        assert!(
            matches!(err, CoreError::LoadFailed { ref message, .. } if message.contains("panicked")),
            "got {err:?}"
        );
        assert!(live.state().error().is_some());
    }
}
