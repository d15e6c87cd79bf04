// FRITZ!Box HTTP client
//
// Wraps `reqwest::Client` with box-specific URL construction and status
// classification. The login handshake and the home automation commands
// are implemented as inherent methods in `auth.rs` and `homeauto.rs`.

use tracing::{debug, trace};
use url::Url;

use crate::auth::SessionId;
use crate::error::Error;
use crate::transport::TransportConfig;

const LOGIN_PATH: &str = "/login_sid.lua";
const HOMEAUTO_PATH: &str = "/webservices/homeautoswitch.lua";

/// Raw HTTP client for one FRITZ!Box.
///
/// Holds no session state: every session-scoped call takes the SID
/// explicitly, so the caller decides when a session is created, reused
/// or replaced.
#[derive(Debug, Clone)]
pub struct FritzClient {
    http: reqwest::Client,
    base_url: Url,
}

impl FritzClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the box root, e.g. `http://fritz.box`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The box base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append `path` to the base URL, keeping any path prefix the base
    /// already carries (reverse proxies).
    fn url_for(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    pub(crate) fn login_url(&self) -> Result<Url, Error> {
        self.url_for(LOGIN_PATH)
    }

    pub(crate) fn homeauto_url(&self) -> Result<Url, Error> {
        self.url_for(HOMEAUTO_PATH)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and return the body of a 200 response.
    ///
    /// 403 maps to [`Error::SessionExpired`]; any other non-200 status
    /// maps to [`Error::Http`].
    pub(crate) async fn get_text(&self, url: Url, query: &[(&str, &str)]) -> Result<String, Error> {
        debug!("GET {}", url.path());
        trace!(
            params = ?query.iter().filter(|(k, _)| *k != "sid" && *k != "response").collect::<Vec<_>>(),
            "query parameters"
        );

        let resp = self.http.get(url).query(query).send().await?;
        let status = resp.status();

        if status == reqwest::StatusCode::FORBIDDEN {
            debug!("request failed: invalid session");
            return Err(Error::SessionExpired);
        }

        if status != reqwest::StatusCode::OK {
            let message = status.canonical_reason().unwrap_or_default().to_owned();
            debug!(status = status.as_u16(), %message, "request failed");
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }

    /// Issue a `switchcmd` against the home automation endpoint.
    ///
    /// `GET /webservices/homeautoswitch.lua?switchcmd=..&ain=..&param=..&sid=..`
    pub async fn command(
        &self,
        sid: &SessionId,
        switchcmd: &str,
        ain: Option<&str>,
        param: Option<&str>,
    ) -> Result<String, Error> {
        let url = self.homeauto_url()?;
        let mut query = vec![("switchcmd", switchcmd)];
        if let Some(ain) = ain {
            query.push(("ain", ain));
        }
        if let Some(param) = param {
            query.push(("param", param));
        }
        query.push(("sid", sid.as_str()));

        self.get_text(url, &query).await
    }
}
