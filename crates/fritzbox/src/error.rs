//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use std::collections::BTreeMap;

use miette::Diagnostic;
use thiserror::Error;

use fritzbox_config::ConfigError;
use fritzbox_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to FRITZ!Box at {url}")]
    #[diagnostic(
        code(fritzbox::connection_failed),
        help(
            "Check that the box is reachable and the host is right.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(fritzbox::auth_failed),
        help(
            "Verify the username and password for profile '{profile}'.\n\
             Run: fritzbox config set-password --profile {profile}"
        )
    )]
    AuthFailed { message: String, profile: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(fritzbox::no_credentials),
        help(
            "Set FRITZBOX_PASSWORD, store one with: fritzbox config set-password\n\
             or add `password` to the profile."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(fritzbox::not_found), help("Available: {available}"))]
    NotFound {
        resource_type: String,
        identifier: String,
        available: String,
    },

    // ── Box ──────────────────────────────────────────────────────────
    #[error("Box error ({code}): {message}")]
    #[diagnostic(code(fritzbox::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fritzbox::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fritzbox::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(fritzbox::config))]
    Config { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

fn describe_candidates(candidates: &BTreeMap<String, String>) -> String {
    if candidates.is_empty() {
        return "no matching devices".into();
    }
    candidates
        .iter()
        .map(|(name, ain)| format!("{name} ({ain})"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Auth { message } => CliError::AuthFailed {
                message,
                profile: "current".into(),
            },

            CoreError::SessionRenewal { source } => CliError::AuthFailed {
                message: format!("session renewal failed: {source}"),
                profile: "current".into(),
            },

            CoreError::Transport { status, message } => CliError::ApiError {
                code: format!("http_{status}"),
                message: format!("HTTP {status} {message}"),
            },

            CoreError::Operation { operation, source } => match *source {
                CoreError::Transport { status, message } => CliError::ApiError {
                    code: format!("http_{status}"),
                    message: format!("{operation} failed: HTTP {status} {message}"),
                },
                CoreError::Internal(message) => CliError::ApiError {
                    code: "operation_failed".into(),
                    message: format!("{operation} failed: {message}"),
                },
                other => CliError::from(other),
            },

            CoreError::NotReady => CliError::ApiError {
                code: "not_ready".into(),
                message: "device list has not been loaded yet".into(),
            },

            CoreError::DeviceNotFound {
                identifier,
                candidates,
            } => CliError::NotFound {
                resource_type: "device".into(),
                identifier,
                available: describe_candidates(&candidates),
            },

            CoreError::UnknownOperation { name, expected } => CliError::Validation {
                field: "operation".into(),
                reason: format!("unknown operation '{name}', expected one of {expected}"),
            },

            CoreError::InvalidArgument { operation, message } => CliError::Validation {
                field: operation,
                reason: message,
            },

            CoreError::Disconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "connection was shut down".into(),
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
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_transport_error_keeps_status() {
        let err = CliError::from(CoreError::Operation {
            operation: "setSwitchOn".into(),
            source: Box::new(CoreError::Transport {
                status: 500,
                message: "Internal Server Error".into(),
            }),
        });

        assert_eq!(err.exit_code(), exit_code::GENERAL);
        assert_eq!(
            err.to_string(),
            "Box error (http_500): setSwitchOn failed: HTTP 500 Internal Server Error"
        );
    }

    #[test]
    fn auth_inside_operation_maps_to_auth_exit() {
        let err = CliError::from(CoreError::Operation {
            operation: "getTemperature".into(),
            source: Box::new(CoreError::Auth {
                message: "invalid session id".into(),
            }),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn unknown_device_lists_candidates() {
        let err = CliError::from(CoreError::DeviceNotFound {
            identifier: "123".into(),
            candidates: BTreeMap::from([("Steckdose".to_owned(), "08761 0000434".to_owned())]),
        });

        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        match err {
            CliError::NotFound { available, .. } => {
                assert_eq!(available, "Steckdose (08761 0000434)");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
