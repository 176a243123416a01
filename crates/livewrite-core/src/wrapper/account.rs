use std::sync::Arc;

use futures_util::future::BoxFuture;
use livewrite_api::RealtimeEvent;
use tracing::warn;

use super::live::{Live, LiveSource, Phase, open_subscription};
use crate::channel::Channel;
use crate::error::CoreError;
use crate::facade::Facade;
use crate::model::{self, User};
use crate::store::{LoadState, StoreStream};

/// The authenticated user, kept current from the `account` channel.
///
/// Like [`Document`](super::Document), each delivery replaces the held
/// user wholesale. Loading fails for guests.
pub struct Account {
    live: Live<Arc<User>>,
}

impl Account {
    /// Start loading the current user. Must be called from within a
    /// Tokio runtime.
    pub fn open(facade: &Facade) -> Self {
        let subscription = open_subscription(facade, &Channel::Account);
        let source = AccountSource {
            facade: facade.clone(),
        };
        Self {
            live: Live::spawn(source, subscription),
        }
    }

    /// Load the current user once, without subscribing.
    pub async fn fetch(facade: &Facade) -> Result<Arc<User>, CoreError> {
        AccountSource {
            facade: facade.clone(),
        }
        .fetch()
        .await
    }

    /// The current user, once loaded.
    pub fn user(&self) -> Option<Arc<User>> {
        self.live.loaded()
    }

    pub fn state(&self) -> LoadState<Arc<User>> {
        self.live.state()
    }

    pub fn subscribe(&self) -> StoreStream<LoadState<Arc<User>>> {
        self.live.subscribe()
    }

    /// Wait for the initial load.
    pub async fn ready(&self) -> Result<Arc<User>, CoreError> {
        self.live.ready().await
    }

    /// Stop listening and wait for the background task to exit.
    pub async fn close(self) {
        self.live.close().await;
    }
}

struct AccountSource {
    facade: Facade,
}

impl LiveSource for AccountSource {
    type Snapshot = Arc<User>;

    fn resource(&self) -> String {
        "account".into()
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Arc<User>, CoreError>> {
        Box::pin(async move {
            let raw = self.facade.account().get().await?;
            Ok(Arc::new(model::decode(&raw)?))
        })
    }

    fn apply(&self, snapshot: &mut Arc<User>, event: &RealtimeEvent, _phase: Phase) -> bool {
        match model::decode::<User>(&event.payload) {
            Ok(user) => {
                *snapshot = Arc::new(user);
                true
            }
            Err(e) => {
                warn!(error = %e, "could not decode account delivery");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, eventually, facade};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn loads_user_and_follows_account_channel() {
        let backend = Arc::new(MockBackend::new());
        backend.set_user(json!({ "$id": "u1", "name": "Ada", "email": "ada@example.com" }));

        let account = Account::open(&facade(&backend));
        let user = account.ready().await.unwrap();
        assert_eq!(user.name, "Ada");

        backend.emit(
            "account",
            &["users.u1.update.name", "users.*.update.name", "users.*.update", "users.*"],
            json!({ "$id": "u1", "name": "Ada Lovelace", "email": "ada@example.com" }),
        );

        let user = eventually(&account.live, |u| u.name == "Ada Lovelace").await;
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(account.user().unwrap().id, "u1");
    }

    #[tokio::test]
    async fn guest_fails_to_load() {
        let backend = Arc::new(MockBackend::new());
        let account = Account::open(&facade(&backend));

        let err = account.ready().await.unwrap_err();
        assert!(matches!(err, CoreError::LoadFailed { ref resource, .. } if resource == "account"));
        assert!(account.user().is_none());
    }

    #[tokio::test]
    async fn fetch_reads_user_once() {
        let backend = Arc::new(MockBackend::new());
        backend.set_user(json!({ "$id": "u1", "name": "Ada", "email": "ada@example.com" }));

        let user = Account::fetch(&facade(&backend)).await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(backend.calls(), vec!["get_account"]);
    }
}
