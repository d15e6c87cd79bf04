//! Shared helpers for command handlers.

use fritzbox_core::OperationOutput;

use crate::error::CliError;

/// An operation answered with a result of the wrong shape.
pub fn unexpected(operation: &str, output: &OperationOutput) -> CliError {
    CliError::ApiError {
        code: "unexpected_response".into(),
        message: format!("{operation} returned {output:?}"),
    }
}

/// Render a thermostat target, spelling out the on/off sentinels.
pub fn format_target(celsius: f64) -> String {
    if celsius.abs() < f64::EPSILON {
        "off".into()
    } else if (celsius - 1.0).abs() < f64::EPSILON {
        "on".into()
    } else {
        format!("{celsius:.1} °C")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_spell_out_sentinels() {
        assert_eq!(format_target(0.0), "off");
        assert_eq!(format_target(1.0), "on");
        assert_eq!(format_target(21.5), "21.5 °C");
    }
}
