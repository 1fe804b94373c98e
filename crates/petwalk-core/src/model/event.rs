// ── Timeline event ──

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use super::ModelError;
use super::pet::Pet;

/// Timestamp format used by the cloud timeline. Always UTC, no offset.
pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Kind of door activity. Unrecognized kinds are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    Open,
    Close,
    On,
    Off,
    Online,
    Offline,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::On => "on",
            Self::Off => "off",
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Other(s) => s,
        }
    }
}

impl FromStr for EventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "open" => Self::Open,
            "close" => Self::Close,
            "on" => Self::On,
            "off" => Self::Off,
            "online" => Self::Online,
            "offline" => Self::Offline,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
pub enum Direction {
    #[strum(serialize = "IN")]
    #[serde(rename = "IN")]
    In,
    #[strum(serialize = "OUT")]
    #[serde(rename = "OUT")]
    Out,
}

/// One entry of the door's activity timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: i64,
    pub event_type: EventType,
    pub event_source: String,
    pub date: DateTime<Utc>,
    pub rfid_index: Option<i64>,
    pub direction: Option<Direction>,
    pub local_component_id: Option<String>,
    pub pet: Option<Pet>,
}

impl Event {
    /// Build an event from one raw timeline entry.
    ///
    /// `id`, `event_type`, `event_source` and `date` are mandatory. A
    /// non-null top-level `pet` wins over `properties.pet`.
    pub fn from_value(value: &Value) -> Result<Self, ModelError> {
        let Value::Object(entry) = value else {
            return Err(ModelError::InvalidField {
                field: "event",
                reason: format!("expected object, got {value}"),
            });
        };

        let id = entry
            .get("id")
            .filter(|v| !v.is_null())
            .ok_or(ModelError::MissingField { field: "id" })?
            .as_i64()
            .ok_or_else(|| invalid("id", "expected integer"))?;
        let event_type = required_str(entry, "event_type")?
            .parse::<EventType>()
            .unwrap_or_else(|never| match never {});
        let event_source = required_str(entry, "event_source")?.to_owned();
        let date = parse_date(required_str(entry, "date")?)?;

        let mut event = Self {
            id,
            event_type,
            event_source,
            date,
            rfid_index: None,
            direction: None,
            local_component_id: None,
            pet: None,
        };

        match entry.get("properties") {
            None | Some(Value::Null) => {}
            Some(Value::Object(properties)) => event.apply_properties(properties)?,
            Some(other) => {
                return Err(invalid("properties", &format!("expected object, got {other}")));
            }
        }

        match entry.get("pet") {
            None | Some(Value::Null) => {}
            Some(pet) => event.pet = Some(pet_from_value(pet)?),
        }

        Ok(event)
    }

    fn apply_properties(&mut self, properties: &Map<String, Value>) -> Result<(), ModelError> {
        for (key, value) in properties {
            match key.as_str() {
                "rfid_index" => {
                    self.rfid_index = match value {
                        Value::Null => None,
                        v => Some(v.as_i64().ok_or_else(|| invalid("rfid_index", "expected integer"))?),
                    };
                }
                "direction" => {
                    self.direction = match value {
                        Value::Null => None,
                        Value::String(s) => Some(
                            s.parse::<Direction>()
                                .map_err(|_| invalid("direction", &format!("unknown direction '{s}'")))?,
                        ),
                        other => return Err(invalid("direction", &format!("expected string, got {other}"))),
                    };
                }
                "localComponentId" => {
                    self.local_component_id = match value {
                        Value::Null => None,
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        other => {
                            return Err(invalid(
                                "localComponentId",
                                &format!("expected string, got {other}"),
                            ));
                        }
                    };
                }
                "pet" => {
                    self.pet = match value {
                        Value::Null => None,
                        v => Some(pet_from_value(v)?),
                    };
                }
                _ => {
                    return Err(ModelError::UnknownKey {
                        context: "event",
                        key: key.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Copy of this event attributed to `pet`.
    pub fn with_pet(&self, pet: Pet) -> Self {
        Self {
            pet: Some(pet),
            ..self.clone()
        }
    }

    pub fn is_open(&self) -> bool {
        self.event_type == EventType::Open
    }
}

fn required_str<'a>(entry: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, ModelError> {
    match entry.get(field) {
        None | Some(Value::Null) => Err(ModelError::MissingField { field }),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(invalid(field, &format!("expected string, got {other}"))),
    }
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, ModelError> {
    NaiveDateTime::parse_from_str(raw, EVENT_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| invalid("date", &format!("'{raw}': {e}")))
}

fn pet_from_value(value: &Value) -> Result<Pet, ModelError> {
    match value {
        Value::Object(map) => Pet::from_event_map(map),
        other => Err(invalid("pet", &format!("expected object, got {other}"))),
    }
}

fn invalid(field: &'static str, reason: &str) -> ModelError {
    ModelError::InvalidField {
        field,
        reason: reason.to_owned(),
    }
}
