// ── Runtime connection configuration ──
//
// These types describe *how* to reach a backend project. They carry
// credential data and connection tuning, but never touch disk.
// The CLI constructs a `FacadeConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// How to authenticate with the backend.
///
/// Carries the actual credential data; `livewrite_api::Credentials` is
/// the wire-level mirror of this type.
#[derive(Debug, Clone, Default)]
pub enum AuthCredentials {
    /// Guest role (or a session created later through
    /// [`Facade::login`](crate::Facade::login)).
    #[default]
    Anonymous,
    /// Server API key.
    ApiKey(SecretString),
    /// Existing session secret.
    Session(SecretString),
    /// Account JWT.
    Jwt(SecretString),
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-hosted instances with self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single backend project.
///
/// Built by the CLI, passed to [`Facade::connect`](crate::Facade::connect).
#[derive(Debug, Clone)]
pub struct FacadeConfig {
    /// REST endpoint, e.g. `https://cloud.appwrite.io/v1`.
    pub endpoint: Url,
    /// Project identifier.
    pub project: String,
    /// Authentication method and credentials.
    pub auth: AuthCredentials,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Whether list wrappers open realtime subscriptions.
    pub realtime_enabled: bool,
}

impl FacadeConfig {
    /// Config with anonymous auth, strict TLS, 30s timeout, realtime on.
    pub fn new(endpoint: Url, project: impl Into<String>) -> Self {
        Self {
            endpoint,
            project: project.into(),
            auth: AuthCredentials::default(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            realtime_enabled: true,
        }
    }
}
