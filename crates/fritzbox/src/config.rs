//! CLI configuration: thin wrapper around `fritzbox_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--host, --username, ...).

use std::time::Duration;

use fritzbox_core::{ConnectionConfig, Credentials, normalize_url};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use fritzbox_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Pick the profile to use.
///
/// An explicitly requested profile must exist; otherwise a missing profile
/// falls back to an empty one so flags and env vars alone can drive the CLI.
pub fn select_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);

    if let Some(profile) = config.profiles.get(&name) {
        return Ok((name, profile.clone()));
    }

    if global.profile.is_some() {
        let mut available: Vec<_> = config.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    Ok((
        name,
        Profile {
            host: "fritz.box".into(),
            ..Profile::default()
        },
    ))
}

/// Translate a `Profile` + global flags into a `ConnectionConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    config: &Config,
    global: &GlobalOpts,
) -> Result<ConnectionConfig, CliError> {
    // 1. Host (flag > env > profile)
    let host = global.host.as_deref().unwrap_or(&profile.host);
    let url = normalize_url(host).map_err(|_| CliError::Validation {
        field: "host".into(),
        reason: format!("invalid host: {host}"),
    })?;

    // 2. Credentials (username flag overrides profile)
    let password = fritzbox_config::resolve_password(profile, profile_name)?;
    let username = global.username.clone().or_else(|| profile.username.clone());
    let credentials = Credentials::new(username, password);

    // 3. TLS verification (--strict-tls forces verification)
    let mut tls = fritzbox_config::profile_tls(profile, &config.defaults);
    if global.strict_tls && profile.ca_cert.is_none() {
        tls = fritzbox_core::TlsVerification::SystemDefaults;
    }

    // 4. Timeout
    let timeout = Duration::from_secs(global.timeout);

    let mut resolved = ConnectionConfig::new(url, credentials);
    resolved.tls = tls;
    resolved.timeout = timeout;
    resolved.refresh_interval_secs = 0;
    Ok(resolved)
}
