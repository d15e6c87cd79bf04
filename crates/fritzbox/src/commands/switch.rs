//! Outlet command handlers.

use serde::Serialize;

use fritzbox_core::{Connection, FunctionMask, Operation, OperationOutput};

use crate::cli::{GlobalOpts, SwitchArgs, SwitchCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct SwitchResult {
    ain: String,
    name: String,
    state: &'static str,
}

pub async fn handle(
    connection: &Connection,
    args: SwitchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = connection.resolve_device(&args.ain, FunctionMask::OUTLET)?;
    let ain = device.ain();

    let on = match args.command {
        SwitchCommand::On => match connection.call(Operation::SetSwitchOn { ain }).await? {
            OperationOutput::Switched(confirmed) => confirmed,
            other => return Err(util::unexpected("setSwitchOn", &other)),
        },
        SwitchCommand::Off => match connection.call(Operation::SetSwitchOff { ain }).await? {
            OperationOutput::Switched(confirmed) => !confirmed,
            other => return Err(util::unexpected("setSwitchOff", &other)),
        },
        SwitchCommand::State => match connection.call(Operation::GetSwitchState { ain }).await? {
            OperationOutput::SwitchState(on) => on,
            other => return Err(util::unexpected("getSwitchState", &other)),
        },
    };

    let result = SwitchResult {
        ain: device.identifier.clone(),
        name: device.name.clone(),
        state: if on { "on" } else { "off" },
    };
    let out = output::render_single(
        &global.output,
        &result,
        |r| format!("{} ({}): {}", r.name, r.ain, r.state),
        |r| r.state.into(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
