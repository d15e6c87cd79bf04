//! Raw operation handler: runs any operation by its wire name.

use fritzbox_core::{Connection, FunctionMask, Operation, OperationKind};

use crate::cli::{CallArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    connection: &Connection,
    args: CallArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let needs_device = args
        .action
        .parse::<OperationKind>()
        .is_ok_and(OperationKind::needs_device);

    // Resolve against the device list so spaced AINs work too.
    let ain = match args.ain.as_deref() {
        Some(given) if needs_device && !given.trim().is_empty() => {
            Some(connection.resolve_device(given, FunctionMask::NONE)?.ain())
        }
        other => other.map(str::to_owned),
    };

    let operation = Operation::from_action(&args.action, ain.as_deref(), args.payload.as_deref())?;
    tracing::debug!(operation = operation.name(), "running raw call");
    let result = connection.call(operation).await?;

    let out = output::render_single(
        &global.output,
        &result,
        |r| serde_json::to_string_pretty(r).unwrap_or_default(),
        |r| serde_json::to_string(r).unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
