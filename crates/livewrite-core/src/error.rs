// ── Core error types ──
//
// User-facing errors from livewrite-core. Consumers never see HTTP
// status codes or raw transport failures directly. The
// `From<livewrite_api::Error>` impl translates them into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Could not decode record: {message}")]
    Decode { message: String },

    // ── Wrapper errors ───────────────────────────────────────────────
    /// The initial fetch of a live wrapper failed.
    #[error("Failed to load {resource}: {message}")]
    LoadFailed { resource: String, message: String },

    /// A [`BucketFile`](crate::BucketFile) could not be downloaded.
    #[error("Could not load file {file_id} from bucket {bucket_id}: {message}")]
    FileDownload {
        bucket_id: String,
        file_id: String,
        message: String,
    },

    #[error("Wrapper closed before it finished loading")]
    Closed,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Machine-readable error type, e.g. `"document_invalid_structure"`.
        kind: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<livewrite_api::Error> for CoreError {
    fn from(err: livewrite_api::Error) -> Self {
        use livewrite_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::InvalidCredential(message) => CoreError::Config { message },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        kind: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Api {
                status: 401,
                message,
                ..
            } => CoreError::AuthenticationFailed { message },
            ApiError::Api {
                status: 404,
                message,
                ..
            } => CoreError::NotFound { message },
            ApiError::Api {
                status,
                message,
                kind,
            } => CoreError::Api {
                message,
                kind,
                status: Some(status),
            },
            ApiError::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("Realtime connection failed: {reason}"),
            },
            ApiError::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("Realtime socket closed (code {code}): {reason}"),
            },
            ApiError::Realtime { code, message } => CoreError::Api {
                message,
                kind: Some(format!("realtime_{code}")),
                status: None,
            },
            ApiError::Deserialization { message, body: _ } => CoreError::Decode { message },
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Decode {
            message: err.to_string(),
        }
    }
}
