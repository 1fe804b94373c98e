//! Device metadata handlers.

use petwalk_core::PetWalk;

use crate::cli::{DeviceArgs, DeviceCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(door: &PetWalk, args: DeviceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match args.command {
        DeviceCommand::Info => output::render_value(&global.output, &door.get_device_info().await?)?,
        DeviceCommand::Name => door.get_device_name().await?,
        DeviceCommand::Serial => door.get_serial_number().await?,
        DeviceCommand::Version => door.get_sw_version().await?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
