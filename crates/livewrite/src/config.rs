//! CLI configuration -- thin wrapper around `livewrite_config` shared types.
//!
//! Re-exports the shared types and layers the global flag overrides
//! (--endpoint, --project, --api-key, ...) on top of the active profile.

use livewrite_core::FacadeConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use livewrite_config::{
    Config, Profile, config_path, load_config, profile_to_facade_config, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Build a `FacadeConfig` from the config file, active profile, and flags.
///
/// Without a stored profile, `--endpoint` and `--project` alone are
/// enough for anonymous (or `--api-key`) access.
pub fn build_facade_config(global: &GlobalOpts) -> Result<FacadeConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.endpoint.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                available: available_profiles(&cfg),
                name: profile_name,
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    apply_overrides(&mut profile, global);
    Ok(profile_to_facade_config(&profile, &profile_name, &cfg.defaults)?)
}

/// Flag values win over profile values.
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref endpoint) = global.endpoint {
        profile.endpoint.clone_from(endpoint);
    }
    if let Some(ref project) = global.project {
        profile.project.clone_from(project);
    }
    if let Some(ref key) = global.api_key {
        profile.auth_mode = "api-key".into();
        profile.api_key = Some(key.clone());
        profile.api_key_env = None;
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if global.no_realtime {
        profile.realtime = Some(false);
    }
}

/// Comma-separated profile names for error help.
pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["livewrite"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["config", "show"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn flags_override_profile_values() {
        let mut profile = Profile {
            endpoint: "https://old.example/v1".into(),
            project: "old".into(),
            timeout: Some(5),
            ..Profile::default()
        };
        let global = global(&[
            "--endpoint",
            "https://new.example/v1",
            "--project",
            "new",
            "--api-key",
            "k",
            "--timeout",
            "9",
            "--no-realtime",
        ]);

        apply_overrides(&mut profile, &global);

        assert_eq!(profile.endpoint, "https://new.example/v1");
        assert_eq!(profile.project, "new");
        assert_eq!(profile.auth_mode, "api-key");
        assert_eq!(profile.api_key.as_deref(), Some("k"));
        assert_eq!(profile.timeout, Some(9));
        assert_eq!(profile.realtime, Some(false));
        assert_eq!(profile.insecure, None);
    }

    #[test]
    fn absent_flags_leave_profile_alone() {
        let mut profile = Profile {
            endpoint: "https://cloud.appwrite.io/v1".into(),
            project: "p".into(),
            realtime: Some(true),
            ..Profile::default()
        };
        apply_overrides(&mut profile, &global(&[]));

        assert_eq!(profile.endpoint, "https://cloud.appwrite.io/v1");
        assert_eq!(profile.auth_mode, "anonymous");
        assert_eq!(profile.realtime, Some(true));
    }
}
