// ── Core error types ──
//
// Errors callers of `Connection` observe. The `From<fritzbox_api::Error>`
// impl classifies transport-layer failures into the auth / renewal /
// transport split; `Connection::call` wraps whatever comes out of the
// executor in `Operation` so the failing command is named.

use std::collections::BTreeMap;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Re-login after a 403 failed. Fatal for the triggering call.
    #[error("Session renewal failed: {source}")]
    SessionRenewal { source: Box<CoreError> },

    // ── Transport errors ─────────────────────────────────────────────
    #[error("HTTP {status} {message}")]
    Transport { status: u16, message: String },

    #[error("Cannot connect to FRITZ!Box at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// What `Connection::call` resolves to on any failure.
    #[error("{operation} failed")]
    Operation {
        operation: String,
        source: Box<CoreError>,
    },

    #[error("Unknown operation: {name} (expected one of {expected})")]
    UnknownOperation { name: String, expected: String },

    #[error("Invalid argument for {operation}: {message}")]
    InvalidArgument { operation: String, message: String },

    // ── Directory errors ─────────────────────────────────────────────
    #[error("Device list has not been loaded yet")]
    NotReady,

    /// `candidates` maps names to identifiers of devices that would have
    /// satisfied the requested capabilities.
    #[error("Unknown device: {identifier}")]
    DeviceNotFound {
        identifier: String,
        candidates: BTreeMap<String, String>,
    },

    // ── Lifecycle / configuration ────────────────────────────────────
    #[error("Connection is not running")]
    Disconnected,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Strip `Operation` wrappers to reach the underlying cause.
    pub fn root_cause(&self) -> &CoreError {
        match self {
            Self::Operation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns `true` for authentication and session renewal failures.
    pub fn is_auth(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::Auth { .. } | Self::SessionRenewal { .. }
        )
    }

    /// The HTTP status behind this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self.root_cause() {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fritzbox_api::Error> for CoreError {
    fn from(err: fritzbox_api::Error) -> Self {
        match err {
            fritzbox_api::Error::Authentication { message } => CoreError::Auth { message },
            fritzbox_api::Error::InvalidCredentials { .. } => CoreError::Auth {
                message: "invalid credentials".into(),
            },
            fritzbox_api::Error::SessionExpired => CoreError::Transport {
                status: 403,
                message: "Forbidden - invalid session id".into(),
            },
            fritzbox_api::Error::Http { status, message } => {
                CoreError::Transport { status, message }
            }
            fritzbox_api::Error::Transport(ref e) => match e.status() {
                Some(status) => CoreError::Transport {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => CoreError::ConnectionFailed {
                    url: e
                        .url()
                        .map_or_else(|| "<unknown>".into(), |u| u.to_string()),
                    reason: e.to_string(),
                },
            },
            fritzbox_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            fritzbox_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            fritzbox_api::Error::InvalidArgument { message } => CoreError::InvalidArgument {
                operation: "setTempTarget".into(),
                message,
            },
            fritzbox_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
