//! Command dispatch: routes each CLI subcommand to its handler.

pub mod call;
pub mod config_cmd;
pub mod devices;
pub mod login;
pub mod switch;
pub mod temp;
pub mod util;

use fritzbox_core::Connection;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a box-facing command.
///
/// Everything except `login` starts with a full connect (login plus device
/// list), since device commands resolve the AIN against the list first.
pub async fn dispatch(
    cmd: Command,
    connection: &Connection,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if matches!(cmd, Command::Login) {
        return login::handle(connection, global).await;
    }

    connection.connect().await?;

    match cmd {
        Command::Devices(args) => devices::handle(connection, args, global),
        Command::Switch(args) => switch::handle(connection, args, global).await,
        Command::Temp(args) => temp::handle(connection, args, global).await,
        Command::Call(args) => call::handle(connection, args, global).await,
        Command::Login | Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
