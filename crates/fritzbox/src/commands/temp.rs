//! Temperature and thermostat command handlers.

use serde::Serialize;

use fritzbox_core::{Connection, FunctionMask, Operation, OperationOutput};

use crate::cli::{GlobalOpts, TempArgs, TempCommand};
use crate::error::CliError;
use crate::output;

use super::util;

/// Thermostat targets the box accepts, in °C.
const TARGET_MIN: f64 = 8.0;
const TARGET_MAX: f64 = 28.0;

#[derive(Serialize)]
struct TempResult {
    ain: String,
    name: String,
    kind: &'static str,
    celsius: f64,
}

/// Parse a `temp set` value: `on`, `off`, or °C within the thermostat range.
fn parse_target(value: &str) -> Result<f64, CliError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" => return Ok(1.0),
        "off" => return Ok(0.0),
        _ => {}
    }

    let celsius: f64 = value.trim().parse().map_err(|_| CliError::Validation {
        field: "value".into(),
        reason: format!("'{value}' is not a temperature"),
    })?;

    if !(TARGET_MIN..=TARGET_MAX).contains(&celsius) {
        return Err(CliError::Validation {
            field: "value".into(),
            reason: format!("{celsius} °C is outside {TARGET_MIN}-{TARGET_MAX} °C"),
        });
    }
    Ok(celsius)
}

pub async fn handle(
    connection: &Connection,
    args: TempArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (kind, celsius, device) = match args.command {
        TempCommand::Get => {
            let device = connection.resolve_device(&args.ain, FunctionMask::TEMPERATURE)?;
            let ain = device.ain();
            match connection.call(Operation::GetTemperature { ain }).await? {
                OperationOutput::Temperature(t) => ("temperature", t, device),
                other => return Err(util::unexpected("getTemperature", &other)),
            }
        }
        TempCommand::Target => {
            let device = connection.resolve_device(&args.ain, FunctionMask::THERMOSTAT)?;
            let ain = device.ain();
            match connection.call(Operation::GetTempTarget { ain }).await? {
                OperationOutput::TempTarget(t) => ("target", t, device),
                other => return Err(util::unexpected("getTempTarget", &other)),
            }
        }
        TempCommand::Set { value } => {
            let celsius = parse_target(&value)?;
            let device = connection.resolve_device(&args.ain, FunctionMask::THERMOSTAT)?;
            let ain = device.ain();
            connection
                .call(Operation::SetTempTarget { ain, celsius })
                .await?;
            ("target", celsius, device)
        }
    };

    let result = TempResult {
        ain: device.identifier.clone(),
        name: device.name.clone(),
        kind,
        celsius,
    };
    let out = output::render_single(
        &global.output,
        &result,
        |r| {
            let value = if r.kind == "target" {
                util::format_target(r.celsius)
            } else {
                format!("{:.1} °C", r.celsius)
            };
            format!("{} ({}) {}: {value}", r.name, r.ain, r.kind)
        },
        |r| r.celsius.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn on_and_off_map_to_sentinels() {
        assert!((parse_target("on").unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(parse_target("OFF").unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn accepts_range_bounds() {
        assert!((parse_target("8").unwrap() - 8.0).abs() < f64::EPSILON);
        assert!((parse_target("21.5").unwrap() - 21.5).abs() < f64::EPSILON);
        assert!((parse_target("28").unwrap() - 28.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert!(matches!(parse_target("7.5"), Err(CliError::Validation { .. })));
        assert!(matches!(parse_target("30"), Err(CliError::Validation { .. })));
        assert!(matches!(parse_target("warm"), Err(CliError::Validation { .. })));
    }
}
