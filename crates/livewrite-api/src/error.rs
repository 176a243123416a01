use thiserror::Error;

/// Top-level error type for the `livewrite-api` crate.
///
/// Covers every failure mode across the HTTP endpoints and the realtime
/// socket. `livewrite-core` maps these into user-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The backend rejected the credentials (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A credential could not be turned into a header value.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Structured error body returned by the backend:
    /// `{"message": "...", "code": 404, "type": "document_not_found"}`.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        /// Machine-readable error type, e.g. `"document_not_found"`.
        kind: Option<String>,
    },

    // ── Realtime ────────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed by the server.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// The realtime server sent an `error` frame.
    #[error("Realtime error (code {code}): {message}")]
    Realtime { code: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session or key is no longer accepted.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::Api { status: 401, .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::WebSocketConnect(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// The backend's machine-readable error type, if available.
    pub fn api_error_kind(&self) -> Option<&str> {
        match self {
            Self::Api { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }
}
