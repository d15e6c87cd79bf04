// ── Device operations ──
//
// The closed set of commands a `Connection` can run. String-driven callers
// (CLI arguments, scripted flows) go through `Operation::from_action`,
// which rejects unknown names before anything is queued.

use serde::Serialize;
use strum::VariantNames;

use crate::error::CoreError;
use crate::model::Device;

/// Operation names as the wire-facing callers know them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::VariantNames,
)]
#[strum(serialize_all = "camelCase")]
pub enum OperationKind {
    GetDeviceList,
    GetSwitchState,
    SetSwitchOn,
    SetSwitchOff,
    GetTemperature,
    GetTempTarget,
    SetTempTarget,
}

impl OperationKind {
    pub fn needs_device(self) -> bool {
        !matches!(self, Self::GetDeviceList)
    }
}

/// A fully specified device command.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    GetDeviceList,
    GetSwitchState { ain: String },
    SetSwitchOn { ain: String },
    SetSwitchOff { ain: String },
    GetTemperature { ain: String },
    GetTempTarget { ain: String },
    /// Target in °C; `0` switches the thermostat off, `1` fully on.
    SetTempTarget { ain: String, celsius: f64 },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::GetDeviceList => OperationKind::GetDeviceList,
            Self::GetSwitchState { .. } => OperationKind::GetSwitchState,
            Self::SetSwitchOn { .. } => OperationKind::SetSwitchOn,
            Self::SetSwitchOff { .. } => OperationKind::SetSwitchOff,
            Self::GetTemperature { .. } => OperationKind::GetTemperature,
            Self::GetTempTarget { .. } => OperationKind::GetTempTarget,
            Self::SetTempTarget { .. } => OperationKind::SetTempTarget,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().into()
    }

    pub fn ain(&self) -> Option<&str> {
        match self {
            Self::GetDeviceList => None,
            Self::GetSwitchState { ain }
            | Self::SetSwitchOn { ain }
            | Self::SetSwitchOff { ain }
            | Self::GetTemperature { ain }
            | Self::GetTempTarget { ain }
            | Self::SetTempTarget { ain, .. } => Some(ain),
        }
    }

    /// Build an operation from its name, a target AIN and an optional
    /// payload (`setTempTarget` needs the temperature in °C).
    pub fn from_action(
        action: &str,
        ain: Option<&str>,
        payload: Option<&str>,
    ) -> Result<Self, CoreError> {
        let kind: OperationKind = action.parse().map_err(|_| CoreError::UnknownOperation {
            name: action.to_owned(),
            expected: OperationKind::VARIANTS.join(", "),
        })?;

        let ain = match (kind.needs_device(), ain) {
            (false, _) => String::new(),
            (true, Some(ain)) if !ain.trim().is_empty() => ain.to_owned(),
            (true, _) => {
                return Err(CoreError::InvalidArgument {
                    operation: kind.to_string(),
                    message: "a device identifier is required".into(),
                });
            }
        };

        Ok(match kind {
            OperationKind::GetDeviceList => Self::GetDeviceList,
            OperationKind::GetSwitchState => Self::GetSwitchState { ain },
            OperationKind::SetSwitchOn => Self::SetSwitchOn { ain },
            OperationKind::SetSwitchOff => Self::SetSwitchOff { ain },
            OperationKind::GetTemperature => Self::GetTemperature { ain },
            OperationKind::GetTempTarget => Self::GetTempTarget { ain },
            OperationKind::SetTempTarget => {
                let celsius = parse_celsius(kind, payload)?;
                Self::SetTempTarget { ain, celsius }
            }
        })
    }
}

fn parse_celsius(kind: OperationKind, payload: Option<&str>) -> Result<f64, CoreError> {
    let invalid = |message: String| CoreError::InvalidArgument {
        operation: kind.to_string(),
        message,
    };

    let Some(raw) = payload else {
        return Err(invalid("a target temperature is required".into()));
    };
    let celsius: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(format!("{raw:?} is not a temperature")))?;
    if !celsius.is_finite() {
        return Err(invalid(format!("{raw:?} is not a temperature")));
    }
    if fritzbox_api::encode_temp_target(celsius).is_none() {
        return Err(invalid(format!(
            "{celsius} °C outside {}..={} (or 0 = off, 1 = on)",
            fritzbox_api::TEMP_TARGET_MIN,
            fritzbox_api::TEMP_TARGET_MAX
        )));
    }
    Ok(celsius)
}

/// Result of a successfully executed operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutput {
    Devices(Vec<Device>),
    /// Relay state reported by the box (`true` = on).
    SwitchState(bool),
    /// Whether the box confirmed the requested switch state.
    Switched(bool),
    /// Degrees Celsius.
    Temperature(f64),
    /// Thermostat target in °C (`0` = off, `1` = on).
    TempTarget(f64),
    Done,
}
