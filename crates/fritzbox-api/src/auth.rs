// Challenge-response login
//
// `login_sid.lua` either reports a SID the box still considers valid, or
// hands out a challenge. The answer is
// `<challenge>-<md5(utf16le("<challenge>-<password>"))>`; the box checks
// it and returns a fresh SID.

use std::fmt;

use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::FritzClient;
use crate::error::Error;

/// The SID the box reports when no session exists.
pub const PLACEHOLDER_SID: &str = "0000000000000000";

/// A live session token.
///
/// Can only be built from a non-empty, non-placeholder value, so holding a
/// `SessionId` means holding something worth sending.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    /// Parse a raw SID, rejecting empty values and the all-zero placeholder.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == PLACEHOLDER_SID {
            None
        } else {
            Some(Self(raw.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionId([REDACTED])")
    }
}

/// Username/password pair for the box.
///
/// Boxes in "password only" mode accept an empty username.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: Option<String>, password: SecretString) -> Self {
        Self {
            username: username.unwrap_or_default(),
            password,
        }
    }
}

/// Compute the challenge response for `challenge` and `password`.
///
/// The digest input is the UTF-16LE encoding of `"<challenge>-<password>"`;
/// hashing the UTF-8 bytes instead yields a well-formed but wrong answer.
pub fn challenge_response(challenge: &str, password: &str) -> String {
    let utf16le: Vec<u8> = format!("{challenge}-{password}")
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect();

    let mut hasher = Md5::new();
    hasher.update(&utf16le);
    format!("{challenge}-{}", hex::encode(hasher.finalize()))
}

/// Extract the text between `<tag>` and `</tag>`, if present.
fn extract_tag<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let len = body[start..].find(&close)?;
    Some(&body[start..start + len])
}

impl FritzClient {
    /// Obtain a session id from the box.
    ///
    /// Reuses a SID the login page already reports, otherwise answers the
    /// challenge. Does not store the result anywhere; callers own the
    /// session.
    pub async fn get_session_id(&self, credentials: &Credentials) -> Result<SessionId, Error> {
        debug!("authenticating at {}", self.base_url());

        let url = self.login_url()?;
        let body = self.get_text(url.clone(), &[]).await?;

        if let Some(sid) = extract_tag(&body, "SID").and_then(SessionId::parse) {
            debug!("reusing existing session");
            return Ok(sid);
        }

        let challenge = extract_tag(&body, "Challenge").ok_or_else(|| Error::Authentication {
            message: "unable to get challenge from FRITZ!Box".into(),
        })?;
        debug!("got challenge");

        let response = challenge_response(challenge, credentials.password.expose_secret());
        let body = self
            .get_text(
                url,
                &[
                    ("username", credentials.username.as_str()),
                    ("response", response.as_str()),
                ],
            )
            .await?;

        let Some(raw) = extract_tag(&body, "SID") else {
            debug!("login answer carried no SID");
            return Err(Error::InvalidCredentials { placeholder: false });
        };

        let sid = SessionId::parse(raw).ok_or_else(|| {
            debug!("login rejected");
            Error::InvalidCredentials {
                placeholder: raw.trim() == PLACEHOLDER_SID,
            }
        })?;

        debug!("login successful");
        Ok(sid)
    }
}
