// ── Runtime connection configuration ──
//
// These types describe *how* to reach one FRITZ!Box. They carry
// credential data and connection tuning, but never touch disk.
// The CLI constructs a `ConnectionConfig` and hands it in.

use std::time::Duration;

use url::Url;

use fritzbox_api::Credentials;

use crate::error::CoreError;

/// Host used when nothing else is configured.
pub const DEFAULT_HOST: &str = "http://fritz.box";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs). Default, boxes ship one.
    #[default]
    DangerAcceptInvalid,
}

impl TlsVerification {
    /// Map the plain "strict TLS" switch onto a verification strategy.
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Self::SystemDefaults
        } else {
            Self::DangerAcceptInvalid
        }
    }
}

/// Configuration for connecting to a single box.
///
/// Built by the CLI (or any other front end), passed to `Connection`.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Box URL (e.g., `http://fritz.box`).
    pub url: Url,
    /// Username (may be empty) and password.
    pub credentials: Credentials,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// How often to re-fetch the device list (seconds). 0 = never.
    pub refresh_interval_secs: u64,
}

impl ConnectionConfig {
    /// Config with default tuning for the given URL and credentials.
    pub fn new(url: Url, credentials: Credentials) -> Self {
        Self {
            url,
            credentials,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_interval_secs: 0,
        }
    }
}

/// Parse a configured host into a URL, prepending `http://` when no
/// scheme is given.
pub fn normalize_url(host: &str) -> Result<Url, CoreError> {
    let host = host.trim();
    let candidate = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_owned()
    } else {
        format!("http://{host}")
    };

    Url::parse(&candidate).map_err(|e| CoreError::Config {
        message: format!("invalid host {host:?}: {e}"),
    })
}
