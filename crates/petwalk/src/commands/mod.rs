//! Command dispatch: bridges CLI args -> facade calls -> output formatting.

pub mod cloud;
pub mod config_cmd;
pub mod device;
pub mod exec;
pub mod fields;
pub mod pets;

use petwalk_core::PetWalk;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a door-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, door: &PetWalk, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status => fields::handle_status(door, global).await,
        Command::Get { field } => fields::handle_get(door, field, global).await,
        Command::Set { field, value } => fields::handle_set(door, field, value, global).await,
        Command::Door(args) => fields::handle_door(door, args, global).await,
        Command::System(args) => fields::handle_system(door, args, global).await,
        Command::Device(args) => device::handle(door, args, global).await,
        Command::Pets(args) => pets::handle(door, args, global).await,
        Command::Cloud(args) => cloud::handle(door, args, global).await,
        Command::Exec(args) => exec::handle(door, args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
    }
}
