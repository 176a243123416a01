//! Shared configuration for the livewrite CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `livewrite_core::FacadeConfig`. The CLI layers its
//! global flags on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use livewrite_core::{AuthCredentials, FacadeConfig, TlsVerification};

const KEYRING_SERVICE: &str = "livewrite";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {secret} configured for profile '{profile}'")]
    NoCredentials { profile: String, secret: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_realtime")]
    pub realtime: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            realtime: default_realtime(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_realtime() -> bool {
    true
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// REST endpoint (e.g., "https://cloud.appwrite.io/v1").
    pub endpoint: String,

    /// Project identifier.
    pub project: String,

    /// Auth mode: "anonymous", "api-key", "session", or "jwt".
    #[serde(default = "default_auth_mode")]
    pub auth_mode: String,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Session secret (plaintext; prefer keyring or env var).
    pub session: Option<String>,

    /// Environment variable name containing the session secret.
    pub session_env: Option<String>,

    /// Account JWT (plaintext; these expire quickly).
    pub jwt: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override the realtime switch for list wrappers.
    pub realtime: Option<bool>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            project: String::new(),
            auth_mode: default_auth_mode(),
            api_key: None,
            api_key_env: None,
            session: None,
            session_env: None,
            jwt: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            realtime: None,
        }
    }
}

fn default_auth_mode() -> String {
    "anonymous".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "livewrite", "livewrite").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("livewrite");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
///
/// A missing file yields the defaults; a malformed one is an error.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Environment keys use `LIVEWRITE_` with `__` for nesting, e.g.
/// `LIVEWRITE_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LIVEWRITE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve a secret through env var → keyring → plaintext.
fn resolve_secret(
    env_name: Option<&str>,
    keyring_key: &str,
    plaintext: Option<&str>,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's env var name
    if let Some(name) = env_name {
        if let Ok(val) = std::env::var(name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{keyring_key}")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(value) = plaintext {
        return Ok(SecretString::from(value.to_owned()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
        secret: keyring_key.into(),
    })
}

/// Resolve an API key from the credential chain.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_secret(
        profile.api_key_env.as_deref(),
        "api-key",
        profile.api_key.as_deref(),
        profile_name,
    )
}

/// Resolve a session secret from the credential chain.
pub fn resolve_session(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_secret(
        profile.session_env.as_deref(),
        "session",
        profile.session.as_deref(),
        profile_name,
    )
}

/// Resolve `AuthCredentials` from a profile's `auth_mode` field.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    match profile.auth_mode.as_str() {
        "anonymous" => Ok(AuthCredentials::Anonymous),
        "api-key" => Ok(AuthCredentials::ApiKey(resolve_api_key(profile, profile_name)?)),
        "session" => Ok(AuthCredentials::Session(resolve_session(profile, profile_name)?)),
        "jwt" => profile
            .jwt
            .as_ref()
            .map(|jwt| AuthCredentials::Jwt(SecretString::from(jwt.clone())))
            .ok_or_else(|| ConfigError::NoCredentials {
                profile: profile_name.into(),
                secret: "jwt".into(),
            }),
        other => Err(ConfigError::Validation {
            field: "auth_mode".into(),
            reason: format!("expected 'anonymous', 'api-key', 'session', or 'jwt', got '{other}'"),
        }),
    }
}

/// Build a `FacadeConfig` from a profile and the global defaults.
pub fn profile_to_facade_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<FacadeConfig, ConfigError> {
    let endpoint: url::Url = profile
        .endpoint
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("invalid URL: {}", profile.endpoint),
        })?;

    if profile.project.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "project".into(),
            reason: "must not be empty".into(),
        });
    }

    let auth = resolve_auth(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(FacadeConfig {
        endpoint,
        project: profile.project.clone(),
        auth,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        realtime_enabled: profile.realtime.unwrap_or(defaults.realtime),
    })
}
