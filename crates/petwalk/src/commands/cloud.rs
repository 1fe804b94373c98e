//! Cloud account handlers.

use serde_json::Value;

use petwalk_core::{Event, PetWalk, convert};

use crate::cli::{CloudArgs, CloudCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::pets::event_row;

/// Explicit door id, or the one reported by the cloud.
pub async fn resolve_door_id(door: &PetWalk, door_id: Option<i64>) -> Result<i64, CliError> {
    match door_id {
        Some(id) => Ok(id),
        None => Ok(door.get_device_id().await?),
    }
}

pub async fn handle(door: &PetWalk, args: CloudArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match args.command {
        CloudCommand::UpdateInfo => output::render_value(&global.output, &door.get_update_info().await?)?,
        CloudCommand::Notifications => {
            output::render_value(&global.output, &door.get_notification_settings().await?)?
        }
        CloudCommand::DeviceId => door.get_device_id().await?.to_string(),
        CloudCommand::Timeline { door_id, days } => {
            let door_id = resolve_door_id(door, door_id).await?;
            let timeline = door.get_timeline(door_id, days).await?;
            render_timeline(global, &timeline)?
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn render_timeline(global: &GlobalOpts, timeline: &Value) -> Result<String, CliError> {
    let events = convert::timeline_entries(timeline)?
        .iter()
        .map(Event::from_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(petwalk_core::CoreError::from)?;

    output::render_list(&global.output, &events, event_row, |e| e.id.to_string())
}
