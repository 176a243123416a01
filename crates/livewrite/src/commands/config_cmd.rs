//! Config subcommand handlers.

use std::fmt::Write as _;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const KEYRING_SERVICE: &str = "livewrite";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "realtime = {}", cfg.defaults.realtime);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "endpoint = \"{}\"", p.endpoint);
        let _ = writeln!(out, "project = \"{}\"", p.project);
        let _ = writeln!(out, "auth_mode = \"{}\"", p.auth_mode);
        if p.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"****\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if p.session.is_some() {
            let _ = writeln!(out, "session = \"****\"");
        }
        if let Some(ref env) = p.session_env {
            let _ = writeln!(out, "session_env = \"{env}\"");
        }
        if p.jwt.is_some() {
            let _ = writeln!(out, "jwt = \"****\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(realtime) = p.realtime {
            let _ = writeln!(out, "realtime = {realtime}");
        }
    }

    out.trim_end().to_owned()
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

/// Apply `key = value` to a profile.
fn set_profile_value(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "endpoint" => profile.endpoint = value,
        "project" => profile.project = value,
        "auth_mode" | "auth-mode" => {
            if !matches!(value.as_str(), "anonymous" | "api-key" | "session" | "jwt") {
                return Err(CliError::Validation {
                    field: "auth_mode".into(),
                    reason: "must be 'anonymous', 'api-key', 'session', or 'jwt'".into(),
                });
            }
            profile.auth_mode = value;
        }
        "api_key" | "api-key" => profile.api_key = Some(value),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
        "session" => profile.session = Some(value),
        "session_env" | "session-env" => profile.session_env = Some(value),
        "jwt" => profile.jwt = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_bool("insecure", &value)?),
        "realtime" => profile.realtime = Some(parse_bool("realtime", &value)?),
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: "timeout".into(),
                reason: "must be a number (seconds)".into(),
            })?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: endpoint, project, auth_mode, \
                     api_key, api_key_env, session, session_env, jwt, ca_cert, insecure, \
                     realtime, timeout"
                ),
            });
        }
    }
    Ok(())
}

/// Keyring entry name for the profile's auth mode.
fn keyring_secret(profile: &Profile) -> Result<(&'static str, &'static str), CliError> {
    match profile.auth_mode.as_str() {
        "api-key" => Ok(("api-key", "API key: ")),
        "session" => Ok(("session", "Session secret: ")),
        other => Err(CliError::Validation {
            field: "auth_mode".into(),
            reason: format!("'{other}' profiles have no secret to store in the keyring"),
        }),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |_| {
                "config".into()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_value(profile, &key, value)?;

            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile_name();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: livewrite config set endpoint <url>");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetSecret { profile } => {
            let cfg = config::load_config()?;
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            let prof = cfg
                .profiles
                .get(&profile_name)
                .ok_or_else(|| CliError::ProfileNotFound {
                    name: profile_name.clone(),
                    available: config::available_profiles(&cfg),
                })?;

            let (key, prompt) = keyring_secret(prof)?;
            let secret = rpassword::prompt_password(prompt)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "secret".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{key}"))
                .map_err(|e| CliError::Validation {
                    field: "keyring".into(),
                    reason: format!("failed to access keyring: {e}"),
                })?;
            entry.set_password(&secret).map_err(|e| CliError::Validation {
                field: "keyring".into(),
                reason: format!("failed to store secret in keyring: {e}"),
            })?;

            eprintln!("✓ {key} stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}
