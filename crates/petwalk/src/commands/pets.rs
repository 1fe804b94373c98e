//! Pet roster and pet status handlers.

use tabled::Tabled;

use petwalk_core::{Event, Pet, PetWalk};

use crate::cli::{GlobalOpts, PetsArgs, PetsCommand};
use crate::error::CliError;
use crate::output;

use super::cloud::resolve_door_id;

#[derive(Tabled)]
struct PetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Species")]
    species: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn pet_row(p: &Pet) -> PetRow {
    PetRow {
        id: p.id.clone(),
        name: p.name.clone(),
        species: p.species.clone().unwrap_or_else(|| "-".into()),
        created: p.created.format("%Y-%m-%d").to_string(),
    }
}

#[derive(Tabled)]
pub(super) struct EventRow {
    #[tabled(rename = "Pet")]
    pet: String,
    #[tabled(rename = "Event")]
    event_type: String,
    #[tabled(rename = "Direction")]
    direction: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub(super) fn event_row(e: &Event) -> EventRow {
    EventRow {
        pet: e.pet.as_ref().map_or_else(|| "-".into(), |p| p.name.clone()),
        event_type: e.event_type.to_string(),
        direction: e.direction.map_or_else(|| "-".into(), |d| d.to_string()),
        date: e.date.format("%Y-%m-%d %H:%M:%S").to_string(),
        source: e.event_source.clone(),
    }
}

pub async fn handle(door: &PetWalk, args: PetsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        PetsCommand::List { include_unknown } => {
            let pets = door.get_available_pets(include_unknown).await?;
            let out = output::render_list(&global.output, &pets, pet_row, |p| p.name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PetsCommand::Status {
            door_id,
            include_unknown,
        } => {
            let door_id = resolve_door_id(door, door_id).await?;
            let status = door.get_pet_status(door_id, include_unknown).await?;
            let events: Vec<Event> = status.into_values().collect();
            let out = output::render_list(&global.output, &events, event_row, |e| {
                let pet = e.pet.as_ref().map_or("-", |p| p.name.as_str());
                format!("{pet}\t{}", e.date.to_rfc3339())
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
