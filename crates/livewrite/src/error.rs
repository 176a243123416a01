//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use livewrite_config::ConfigError;
use livewrite_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to backend at {url}")]
    #[diagnostic(
        code(livewrite::connection_failed),
        help(
            "Check that the endpoint is reachable and includes the API path.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(livewrite::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(livewrite::auth_failed),
        help(
            "Verify the profile's credentials and the project's permissions.\n\
             Store a fresh secret with: livewrite config set-secret"
        )
    )]
    AuthFailed { message: String },

    #[error("No {secret} configured for profile '{profile}'")]
    #[diagnostic(
        code(livewrite::no_credentials),
        help(
            "Store one with: livewrite config set-secret --profile {profile}\n\
             Or set LIVEWRITE_API_KEY for API key profiles."
        )
    )]
    NoCredentials { profile: String, secret: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(livewrite::not_found))]
    NotFound { message: String },

    #[error("Failed to load {resource}")]
    #[diagnostic(code(livewrite::load_failed), help("{message}"))]
    LoadFailed { resource: String, message: String },

    #[error("Could not download file '{file_id}' from bucket '{bucket_id}'")]
    #[diagnostic(
        code(livewrite::file_download),
        help("{message}\nRun: livewrite bucket list {bucket_id} to see available files")
    )]
    FileDownload {
        bucket_id: String,
        file_id: String,
        message: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(livewrite::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(livewrite::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(livewrite::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: livewrite config set endpoint <url> --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(livewrite::no_config),
        help(
            "Pass --endpoint and --project, or configure a profile:\n  \
             livewrite config set endpoint https://cloud.appwrite.io/v1\n  \
             livewrite config set project <project-id>\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(livewrite::config))]
    Config { message: String },

    // ── IO / Rendering ───────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(livewrite::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::NotFound { message } => CliError::NotFound { message },
            CoreError::LoadFailed { resource, message } => {
                CliError::LoadFailed { resource, message }
            }
            CoreError::FileDownload {
                bucket_id,
                file_id,
                message,
            } => CliError::FileDownload {
                bucket_id,
                file_id,
                message,
            },
            CoreError::Api { message, kind, .. } => CliError::ApiError {
                code: kind.unwrap_or_else(|| "unknown".into()),
                message,
            },
            CoreError::Decode { message } => CliError::ApiError {
                code: "decode".into(),
                message,
            },
            CoreError::Closed => CliError::ApiError {
                code: "closed".into(),
                message: "the view was closed before it finished loading".into(),
            },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile, secret } => {
                CliError::NoCredentials { profile, secret }
            }
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
