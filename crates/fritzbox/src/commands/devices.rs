//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use fritzbox_core::{Connection, Device, FunctionMask};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "AIN")]
    ain: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
    #[tabled(rename = "Present")]
    present: String,
    #[tabled(rename = "Capabilities")]
    capabilities: String,
}

fn device_row(d: &Arc<Device>) -> DeviceRow {
    DeviceRow {
        ain: d.identifier.clone(),
        name: d.name.clone(),
        product: d.product_name.clone(),
        firmware: d.firmware_version.clone(),
        present: if d.present { "yes" } else { "no" }.into(),
        capabilities: d.functions.to_string(),
    }
}

fn detail(d: &Arc<Device>) -> String {
    [
        format!("AIN:          {}", d.identifier),
        format!("Name:         {}", d.name),
        format!("ID:           {}", d.id),
        format!("Product:      {} {}", d.manufacturer, d.product_name),
        format!("Firmware:     {}", d.firmware_version),
        format!("Present:      {}", if d.present { "yes" } else { "no" }),
        format!("Capabilities: {} ({})", d.functions, d.functions.bits()),
    ]
    .join("\n")
}

/// Combine `--capability` names into one mask.
fn capability_mask(names: &[String]) -> Result<FunctionMask, CliError> {
    names.iter().try_fold(FunctionMask::NONE, |mask, name| {
        FunctionMask::from_name(name)
            .map(|flag| mask | flag)
            .ok_or_else(|| CliError::Validation {
                field: "capability".into(),
                reason: format!("unknown capability '{name}'"),
            })
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    connection: &Connection,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List { capability } => {
            let required = capability_mask(&capability)?;
            let devices: Vec<Arc<Device>> = connection
                .devices_snapshot()
                .iter()
                .filter(|d| d.supports(required))
                .cloned()
                .collect();

            let out =
                output::render_list(&global.output, &devices, device_row, |d| {
                    d.identifier.clone()
                });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { ain } => {
            let device = connection.resolve_device(&ain, FunctionMask::NONE)?;
            let out = output::render_single(&global.output, &device, detail, |d| {
                d.identifier.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
