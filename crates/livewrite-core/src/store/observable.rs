use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Observable cell holding a value of type `T`.
///
/// Cloning a `Store` shares the same cell. Writes notify every
/// [`StoreStream`]; reads never block writers for longer than a clone.
pub struct Store<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Store<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Read the current value in place.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.sender.borrow())
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Mutate in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.sender.send_modify(f);
    }

    /// Mutate in place; subscribers are only notified when `f` returns `true`.
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.sender.send_if_modified(f)
    }

    /// Subscribe to changes, starting from the current value.
    pub fn subscribe(&self) -> StoreStream<T> {
        StoreStream::new(self.sender.subscribe())
    }

    /// Wait until the value satisfies `predicate`, returning a clone of it.
    pub async fn wait_for(&self, mut predicate: impl FnMut(&T) -> bool) -> T {
        let mut receiver = self.sender.subscribe();
        match receiver.wait_for(|value| predicate(value)).await {
            Ok(value) => T::clone(&value),
            // Unreachable while `self` holds the sender.
            Err(_) => self.get(),
        }
    }
}

/// A subscription to a [`Store`].
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed`](Self::changed) or by converting to a `Stream`.
pub struct StoreStream<T> {
    current: T,
    receiver: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> StoreStream<T> {
    fn new(mut receiver: watch::Receiver<T>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The snapshot seen most recently by this subscription.
    pub fn current(&self) -> &T {
        &self.current
    }

    /// The latest value (may have changed since the last `changed()`).
    pub fn latest(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new value.
    /// Returns `None` once every [`Store`] handle has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        let value = self.receiver.borrow_and_update().clone();
        self.current = value.clone();
        Some(value)
    }

    /// Convert into a `Stream`. The first item is the current value.
    pub fn into_stream(self) -> StoreWatchStream<T> {
        StoreWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a new value each time the store changes.
pub struct StoreWatchStream<T> {
    inner: WatchStream<T>,
}

impl<T: Clone + Send + Sync + 'static> Stream for StoreWatchStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[test]
    fn get_set_update() {
        let store = Store::new(1_u32);
        assert_eq!(store.get(), 1);

        store.set(5);
        assert_eq!(store.get(), 5);

        store.update(|v| *v += 1);
        assert_eq!(store.with(|v| *v), 6);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = Store::new(String::from("a"));
        let mut stream = store.subscribe();
        assert_eq!(stream.current(), "a");

        store.set("b".into());
        assert_eq!(stream.changed().await.as_deref(), Some("b"));
        assert_eq!(stream.current(), "b");
    }

    #[tokio::test]
    async fn update_if_skips_notification() {
        let store = Store::new(0_u32);
        let mut stream = store.subscribe();

        assert!(!store.update_if(|_| false));
        assert!(store.update_if(|v| {
            *v = 3;
            true
        }));

        assert_eq!(stream.changed().await, Some(3));
    }

    #[tokio::test]
    async fn changed_ends_when_store_dropped() {
        let store = Store::new(0_u8);
        let mut stream = store.subscribe();
        drop(store);
        assert_eq!(stream.changed().await, None);
        assert_eq!(stream.latest(), 0);
    }

    #[tokio::test]
    async fn stream_yields_current_then_changes() {
        let store = Store::new(1_i32);
        let mut stream = store.subscribe().into_stream();

        assert_eq!(stream.next().await, Some(1));
        store.set(2);
        assert_eq!(stream.next().await, Some(2));
    }

    #[tokio::test]
    async fn wait_for_returns_matching_value() {
        let store = Store::new(0_u32);
        let writer = store.clone();
        let handle = tokio::spawn(async move {
            for i in 1..=5 {
                writer.set(i);
                tokio::task::yield_now().await;
            }
        });

        let value = store.wait_for(|v| *v >= 5).await;
        assert_eq!(value, 5);
        handle.await.ok();
    }
}
