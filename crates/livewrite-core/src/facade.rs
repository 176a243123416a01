// ── Facade ──
//
// The single handle wrappers are constructed from. Holds one service of
// each kind plus the realtime gate; cloning shares the same services.

use std::sync::Arc;

use livewrite_api::{AppwriteClient, Credentials, TlsMode, TransportConfig};
use secrecy::SecretString;
use tracing::info;

use crate::config::{AuthCredentials, FacadeConfig, TlsVerification};
use crate::error::CoreError;
use crate::service::{
    AccountService, AppwriteBackend, DatabaseService, RealtimeService, StorageService,
};

/// Shared entry point to a backend project.
///
/// Cheaply cloneable; every wrapper keeps a clone for the duration of
/// its background task.
#[derive(Clone)]
pub struct Facade {
    inner: Arc<FacadeInner>,
}

struct FacadeInner {
    databases: Arc<dyn DatabaseService>,
    storage: Arc<dyn StorageService>,
    account: Arc<dyn AccountService>,
    realtime: Arc<dyn RealtimeService>,
    realtime_enabled: bool,
}

impl Facade {
    /// Build a facade over the HTTP and realtime clients for `config`.
    ///
    /// No request is made here; the first I/O happens when a wrapper
    /// loads. Must be called from within a Tokio runtime if realtime is
    /// enabled, since subscriptions spawn their socket tasks.
    pub fn connect(config: FacadeConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: tls_mode(&config.tls),
            timeout: config.timeout,
            cookie_jar: None,
        };
        let client = AppwriteClient::new(
            config.endpoint.as_str(),
            config.project.clone(),
            credentials(&config.auth),
            &transport,
        )?;

        info!(
            endpoint = %config.endpoint,
            project = %config.project,
            realtime = config.realtime_enabled,
            "facade ready"
        );

        let backend = Arc::new(AppwriteBackend::new(Arc::new(client)));
        Self::builder()
            .backend(backend)
            .realtime_enabled(config.realtime_enabled)
            .build()
    }

    /// Start assembling a facade from explicit service handles.
    pub fn builder() -> FacadeBuilder {
        FacadeBuilder::default()
    }

    pub fn databases(&self) -> &Arc<dyn DatabaseService> {
        &self.inner.databases
    }

    pub fn storage(&self) -> &Arc<dyn StorageService> {
        &self.inner.storage
    }

    pub fn account(&self) -> &Arc<dyn AccountService> {
        &self.inner.account
    }

    pub fn realtime(&self) -> &Arc<dyn RealtimeService> {
        &self.inner.realtime
    }

    /// Whether list wrappers subscribe to realtime channels.
    pub fn realtime_enabled(&self) -> bool {
        self.inner.realtime_enabled
    }

    /// Create an email/password session on the account service.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), CoreError> {
        self.inner.account.login(email, password).await
    }

    /// Delete the current session.
    pub async fn logout(&self) -> Result<(), CoreError> {
        self.inner.account.logout().await
    }
}

fn credentials(auth: &AuthCredentials) -> Credentials {
    match auth {
        AuthCredentials::Anonymous => Credentials::Anonymous,
        AuthCredentials::ApiKey(key) => Credentials::ApiKey(key.clone()),
        AuthCredentials::Session(secret) => Credentials::Session(secret.clone()),
        AuthCredentials::Jwt(token) => Credentials::Jwt(token.clone()),
    }
}

fn tls_mode(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Builder for a [`Facade`] with explicit service handles.
pub struct FacadeBuilder {
    databases: Option<Arc<dyn DatabaseService>>,
    storage: Option<Arc<dyn StorageService>>,
    account: Option<Arc<dyn AccountService>>,
    realtime: Option<Arc<dyn RealtimeService>>,
    realtime_enabled: bool,
}

impl Default for FacadeBuilder {
    fn default() -> Self {
        Self {
            databases: None,
            storage: None,
            account: None,
            realtime: None,
            realtime_enabled: true,
        }
    }
}

impl FacadeBuilder {
    /// Use one backend for all four services.
    pub fn backend<B>(self, backend: Arc<B>) -> Self
    where
        B: DatabaseService + StorageService + AccountService + RealtimeService + 'static,
    {
        self.databases(backend.clone())
            .storage(backend.clone())
            .account(backend.clone())
            .realtime(backend)
    }

    pub fn databases(mut self, service: Arc<dyn DatabaseService>) -> Self {
        self.databases = Some(service);
        self
    }

    pub fn storage(mut self, service: Arc<dyn StorageService>) -> Self {
        self.storage = Some(service);
        self
    }

    pub fn account(mut self, service: Arc<dyn AccountService>) -> Self {
        self.account = Some(service);
        self
    }

    pub fn realtime(mut self, service: Arc<dyn RealtimeService>) -> Self {
        self.realtime = Some(service);
        self
    }

    pub fn realtime_enabled(mut self, enabled: bool) -> Self {
        self.realtime_enabled = enabled;
        self
    }

    pub fn build(self) -> Result<Facade, CoreError> {
        let missing = |name: &str| CoreError::Config {
            message: format!("facade is missing a {name} service"),
        };

        Ok(Facade {
            inner: Arc::new(FacadeInner {
                databases: self.databases.ok_or_else(|| missing("database"))?,
                storage: self.storage.ok_or_else(|| missing("storage"))?,
                account: self.account.ok_or_else(|| missing("account"))?,
                realtime: self.realtime.ok_or_else(|| missing("realtime"))?,
                realtime_enabled: self.realtime_enabled,
            }),
        })
    }
}
