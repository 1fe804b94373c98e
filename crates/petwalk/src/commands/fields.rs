//! Local mode/state handlers: status, get, set, door, system.

use serde::Serialize;
use tabled::Tabled;

use petwalk_core::{ApiField, PetWalk};

use crate::cli::{DoorArgs, DoorCommand, GlobalOpts, SystemArgs, SystemCommand};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct FieldValue {
    field: String,
    value: bool,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: &'static str,
}

fn label(field: &str, value: bool) -> &'static str {
    match (field, value) {
        ("door", true) => "open",
        ("door", false) => "closed",
        (_, true) => "on",
        (_, false) => "off",
    }
}

fn to_row(v: &FieldValue) -> FieldRow {
    FieldRow {
        field: v.field.clone(),
        value: label(&v.field, v.value),
    }
}

pub async fn handle_status(door: &PetWalk, global: &GlobalOpts) -> Result<(), CliError> {
    let data: Vec<FieldValue> = door
        .get_api_data()
        .await?
        .into_iter()
        .map(|(field, value)| FieldValue { field, value })
        .collect();

    let out = output::render_list(&global.output, &data, to_row, |v| {
        format!("{}={}", v.field, label(&v.field, v.value))
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_get(door: &PetWalk, field: ApiField, global: &GlobalOpts) -> Result<(), CliError> {
    let value = FieldValue {
        field: field.wire_name().to_owned(),
        value: door.get_field(field).await?,
    };
    let out = output::render_single(
        &global.output,
        &value,
        |v| format!("{}: {}", v.field, label(&v.field, v.value)),
        |v| label(&v.field, v.value).to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_set(
    door: &PetWalk,
    field: ApiField,
    value: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    door.set_field(field, value).await?;
    if !global.quiet {
        eprintln!("{field} set to {}", label(field.wire_name(), value));
    }
    Ok(())
}

pub async fn handle_door(door: &PetWalk, args: DoorArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DoorCommand::Status => handle_get(door, ApiField::Door, global).await,
        DoorCommand::Open => handle_set(door, ApiField::Door, true, global).await,
        DoorCommand::Close => handle_set(door, ApiField::Door, false, global).await,
    }
}

pub async fn handle_system(
    door: &PetWalk,
    args: SystemArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SystemCommand::Status => handle_get(door, ApiField::System, global).await,
        SystemCommand::On => handle_set(door, ApiField::System, true, global).await,
        SystemCommand::Off => handle_set(door, ApiField::System, false, global).await,
    }
}
