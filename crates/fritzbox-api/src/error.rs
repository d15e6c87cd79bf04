use thiserror::Error;

/// Top-level error type for the `fritzbox-api` crate.
///
/// Covers the login handshake, HTTP status handling, and response decoding.
/// `fritzbox-core` maps these into the session-aware error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The login page could not be used (no challenge, malformed body).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The box answered the challenge response without a usable SID.
    ///
    /// `placeholder` is set when the answer carried the all-zero SID
    /// rather than no SID at all.
    #[error("Authentication failed: invalid credentials")]
    InvalidCredentials { placeholder: bool },

    /// HTTP 403 on a session-scoped request: the SID is no longer valid.
    #[error("403 Forbidden -- invalid session id")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// Any non-200, non-403 HTTP status.
    #[error("HTTP {status} {message}")]
    Http { status: u16, message: String },

    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// A command argument the box cannot represent; nothing was sent.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A command answered with a body that could not be interpreted.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the box rejected the session and a fresh
    /// login might resolve it.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// The HTTP status carried by this error, if any.
    ///
    /// [`SessionExpired`](Self::SessionExpired) reports 403.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired => Some(403),
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a transient network error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
