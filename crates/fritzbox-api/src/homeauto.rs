// Home automation commands
//
// Thin typed wrappers over `homeautoswitch.lua` switch commands. Each one
// is a single GET; bodies are plain text with a trailing newline.

use tracing::debug;

use crate::auth::SessionId;
use crate::client::FritzClient;
use crate::devicelist::{DeviceInfo, decode_device_list};
use crate::error::Error;

/// Thermostat target value meaning "off".
pub const TEMP_TARGET_OFF: u16 = 253;
/// Thermostat target value meaning "fully on".
pub const TEMP_TARGET_ON: u16 = 254;
/// Lowest settable target in °C.
pub const TEMP_TARGET_MIN: f64 = 8.0;
/// Highest settable target in °C.
pub const TEMP_TARGET_MAX: f64 = 28.0;

/// Encode a target temperature in °C for `sethkrtsoll`.
///
/// `0` and `1` are the off/on sentinels; anything else must lie within
/// [`TEMP_TARGET_MIN`]..=[`TEMP_TARGET_MAX`] and is mapped to the box's
/// half-degree scale (16 = 8 °C). Returns `None` for values the box
/// cannot represent.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_temp_target(celsius: f64) -> Option<u16> {
    if celsius == 0.0 {
        Some(TEMP_TARGET_OFF)
    } else if celsius == 1.0 {
        Some(TEMP_TARGET_ON)
    } else if (TEMP_TARGET_MIN..=TEMP_TARGET_MAX).contains(&celsius) {
        Some(((celsius - 8.0) * 2.0 + 16.0).round() as u16)
    } else {
        None
    }
}

/// Decode a `gethkrtsoll` value into °C, mapping the sentinels to `0`/`1`.
pub fn decode_temp_target(raw: u16) -> f64 {
    match raw {
        TEMP_TARGET_OFF => 0.0,
        TEMP_TARGET_ON => 1.0,
        v => (f64::from(v) - 16.0) / 2.0 + 8.0,
    }
}

fn parse_body<T: std::str::FromStr>(body: &str, what: &str) -> Result<T, Error> {
    body.trim().parse().map_err(|_| Error::Deserialization {
        message: format!("{what}: unexpected answer {:?}", body.trim()),
        body: body.to_owned(),
    })
}

impl FritzClient {
    /// Fetch and decode the full device list.
    ///
    /// `switchcmd=getdevicelistinfos`
    pub async fn device_list_infos(&self, sid: &SessionId) -> Result<Vec<DeviceInfo>, Error> {
        debug!("fetching device list");
        let body = self.command(sid, "getdevicelistinfos", None, None).await?;
        Ok(decode_device_list(&body))
    }

    /// Current relay state of a switchable outlet.
    ///
    /// `switchcmd=getswitchstate`
    pub async fn switch_state(&self, sid: &SessionId, ain: &str) -> Result<bool, Error> {
        debug!(ain, "getting switch state");
        let body = self.command(sid, "getswitchstate", Some(ain), None).await?;
        Ok(body.trim() == "1")
    }

    /// Switch an outlet on. Returns `true` when the box confirms the
    /// outlet is now on.
    ///
    /// `switchcmd=setswitchon` (answers `1`)
    pub async fn set_switch_on(&self, sid: &SessionId, ain: &str) -> Result<bool, Error> {
        debug!(ain, "switching on");
        let body = self.command(sid, "setswitchon", Some(ain), None).await?;
        Ok(body.trim() == "1")
    }

    /// Switch an outlet off. Returns `true` when the box confirms the
    /// outlet is now off.
    ///
    /// `switchcmd=setswitchoff` (answers `0`)
    pub async fn set_switch_off(&self, sid: &SessionId, ain: &str) -> Result<bool, Error> {
        debug!(ain, "switching off");
        let body = self.command(sid, "setswitchoff", Some(ain), None).await?;
        Ok(body.trim() == "0")
    }

    /// Measured temperature in °C.
    ///
    /// `switchcmd=gettemperature` (answer is in tenths of a degree)
    pub async fn temperature(&self, sid: &SessionId, ain: &str) -> Result<f64, Error> {
        debug!(ain, "getting temperature");
        let body = self.command(sid, "gettemperature", Some(ain), None).await?;
        let tenths: f64 = parse_body(&body, "gettemperature")?;
        Ok(tenths / 10.0)
    }

    /// Thermostat target in °C (`0` = off, `1` = on).
    ///
    /// `switchcmd=gethkrtsoll`
    pub async fn temp_target(&self, sid: &SessionId, ain: &str) -> Result<f64, Error> {
        debug!(ain, "getting target temperature");
        let body = self.command(sid, "gethkrtsoll", Some(ain), None).await?;
        let raw: u16 = parse_body(&body, "gethkrtsoll")?;
        Ok(decode_temp_target(raw))
    }

    /// Set the thermostat target in °C (`0` = off, `1` = on).
    ///
    /// Targets outside the settable range are rejected with
    /// [`Error::InvalidArgument`] before anything is sent.
    ///
    /// `switchcmd=sethkrtsoll&param=<encoded>`
    pub async fn set_temp_target(
        &self,
        sid: &SessionId,
        ain: &str,
        celsius: f64,
    ) -> Result<(), Error> {
        let value = encode_temp_target(celsius).ok_or_else(|| Error::InvalidArgument {
            message: format!(
                "target {celsius} °C outside {TEMP_TARGET_MIN}..={TEMP_TARGET_MAX} (or 0 = off, 1 = on)"
            ),
        })?;
        debug!(ain, celsius, value, "setting target temperature");
        self.command(sid, "sethkrtsoll", Some(ain), Some(&value.to_string()))
            .await?;
        Ok(())
    }
}
