//! Raw device command handlers.

use secrecy::SecretString;

use petwalk_core::{DeviceCommand, PetWalk};

use crate::cli::{ExecArgs, ExecCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

fn to_device_command(cmd: ExecCommand) -> DeviceCommand {
    match cmd {
        ExecCommand::RfidLearn { slot } => DeviceCommand::RfidStartLearn { slot },
        ExecCommand::RfidStop => DeviceCommand::RfidStopLearn,
        ExecCommand::RfidDelete { index } => DeviceCommand::RfidDelete { index },
        ExecCommand::RfidDeleteAll => DeviceCommand::RfidDeleteAll,
        ExecCommand::RfidDeletePet { pet_id } => DeviceCommand::RfidDeletePet { pet_id },
        ExecCommand::RfidTags => DeviceCommand::RfidTagList,
        ExecCommand::RfidTagExists => DeviceCommand::RfidTagExists,
        ExecCommand::ZigbeeDevices => DeviceCommand::ZigBeeListDevices,
        ExecCommand::ZigbeeRemove { component_id } => {
            DeviceCommand::ZigBeeRemoveDevice { component_id }
        }
        ExecCommand::ZigbeeJoin { join_type } => DeviceCommand::ZigBeeStartJoin { join_type },
        ExecCommand::ZigbeeJoinStatus => DeviceCommand::ZigBeeJoinStatus,
        ExecCommand::ZigbeeConfirm { component_id } => {
            DeviceCommand::ZigBeeJoinConfirm { component_id }
        }
        ExecCommand::ZigbeeUpdate => DeviceCommand::ZigBeeUpdate,
        ExecCommand::ZigbeeName { component_id, name } => {
            DeviceCommand::ZigBeeNameDevice { component_id, name }
        }
        ExecCommand::WifiList => DeviceCommand::WifiNetworkList,
        ExecCommand::WifiScan => DeviceCommand::WifiScan,
        ExecCommand::WifiSet { ssid, password } => DeviceCommand::WifiNetworkSet {
            ssid,
            password: SecretString::from(password),
        },
        ExecCommand::TimeSet { time } => DeviceCommand::TimeSet { time },
        ExecCommand::FactoryReset => DeviceCommand::FactoryReset,
        ExecCommand::InitDrive => DeviceCommand::InitDriveStart,
    }
}

pub async fn handle(door: &PetWalk, args: ExecArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let command = to_device_command(args.command);
    if command.is_destructive() && !global.yes {
        return Err(CliError::NonInteractiveRequiresYes {
            action: command.name().into(),
        });
    }

    let reply = door.execute(&command).await?;
    let out = output::render_value(&global.output, &reply)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_wire_commands() {
        assert_eq!(to_device_command(ExecCommand::RfidTags).name(), "RFIDTagList");
        assert_eq!(
            to_device_command(ExecCommand::ZigbeeJoin { join_type: None }).name(),
            "ZigBeeJoinAllowed"
        );
        assert!(to_device_command(ExecCommand::FactoryReset).is_destructive());
        assert!(!to_device_command(ExecCommand::WifiScan).is_destructive());
    }
}
