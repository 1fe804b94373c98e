use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::ModelError;

pub const UNKNOWN_PET_ID: &str = "unknown";
pub const UNKNOWN_PET_NAME: &str = "unknown";

/// A registered animal profile, or the synthetic unknown-pet placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub species: Option<String>,
    pub config_in: Option<String>,
    pub config_out: Option<String>,
    pub created: DateTime<Utc>,
    pub unknown: bool,
}

impl Pet {
    /// Placeholder for door activity that no registered pet accounts for.
    pub fn unknown_placeholder() -> Self {
        Self {
            id: UNKNOWN_PET_ID.to_owned(),
            name: UNKNOWN_PET_NAME.to_owned(),
            species: None,
            config_in: None,
            config_out: None,
            created: DateTime::<Utc>::UNIX_EPOCH,
            unknown: true,
        }
    }

    /// Parse one positional DeviceInfo roster entry:
    /// `[id, name, species, {"in": .., "out": ..}, created_epoch_secs, ...]`.
    ///
    /// Returns `Ok(None)` for unused slots (null name).
    pub fn from_roster_entry(entry: &[Value]) -> Result<Option<Self>, ModelError> {
        let name = match entry.get(1) {
            None => return Err(ModelError::MissingField { field: "name" }),
            Some(Value::Null) => return Ok(None),
            Some(v) => string_field("name", v)?,
        };
        let id = entry
            .first()
            .ok_or(ModelError::MissingField { field: "id" })
            .and_then(|v| string_field("id", v))?;

        let species = match entry.get(2) {
            None | Some(Value::Null) => None,
            Some(v) => Some(species(v)?),
        };

        let (config_in, config_out) = match entry.get(3) {
            None | Some(Value::Null) => (None, None),
            Some(Value::Object(config)) => (
                optional_string("in", config.get("in"))?,
                optional_string("out", config.get("out"))?,
            ),
            Some(other) => {
                return Err(ModelError::InvalidField {
                    field: "config",
                    reason: format!("expected object, got {other}"),
                });
            }
        };

        let created = match entry.get(4) {
            None | Some(Value::Null) => DateTime::<Utc>::UNIX_EPOCH,
            Some(v) => timestamp("created", v)?,
        };

        Ok(Some(Self {
            id,
            name,
            species,
            config_in,
            config_out,
            created,
            unknown: false,
        }))
    }

    /// Parse a keyed pet map as embedded in timeline events.
    ///
    /// Keys are matched case-insensitively; anything other than `id`, `name`
    /// and `species` is rejected. A missing id becomes the empty string and a
    /// missing or null name becomes the unknown-pet name.
    pub fn from_event_map(map: &Map<String, Value>) -> Result<Self, ModelError> {
        let mut id = None;
        let mut name = None;
        let mut species_value = None;

        for (key, value) in map {
            match key.to_ascii_lowercase().as_str() {
                "id" => id = Some(string_field("id", value)?),
                "name" => name = optional_string("name", Some(value))?,
                "species" => {
                    species_value = match value {
                        Value::Null => None,
                        v => Some(species(v)?),
                    };
                }
                _ => {
                    return Err(ModelError::UnknownKey {
                        context: "pet",
                        key: key.clone(),
                    });
                }
            }
        }

        Ok(Self {
            id: id.unwrap_or_default(),
            name: name.unwrap_or_else(|| UNKNOWN_PET_NAME.to_owned()),
            species: species_value,
            config_in: None,
            config_out: None,
            created: DateTime::<Utc>::UNIX_EPOCH,
            unknown: false,
        })
    }
}

/// Integer codes map to a fixed vocabulary; strings pass through.
fn species(value: &Value) -> Result<String, ModelError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok("cat".to_owned()),
            Some(1) => Ok("dog".to_owned()),
            Some(code) => Err(ModelError::UnknownSpecies { code }),
            None => Err(ModelError::InvalidField {
                field: "species",
                reason: format!("non-integer code {n}"),
            }),
        },
        other => Err(ModelError::InvalidField {
            field: "species",
            reason: format!("expected string or integer, got {other}"),
        }),
    }
}

/// Identifiers arrive as strings or bare numbers.
fn string_field(field: &'static str, value: &Value) -> Result<String, ModelError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ModelError::InvalidField {
            field,
            reason: format!("expected string, got {other}"),
        }),
    }
}

fn optional_string(field: &'static str, value: Option<&Value>) -> Result<Option<String>, ModelError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => string_field(field, v).map(Some),
    }
}

fn timestamp(field: &'static str, value: &Value) -> Result<DateTime<Utc>, ModelError> {
    value
        .as_i64()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| ModelError::InvalidField {
            field,
            reason: format!("expected epoch seconds, got {value}"),
        })
}
