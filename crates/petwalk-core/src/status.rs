// ── Per-pet status reconciliation ──
//
// Collapses a raw timeline into the latest "door opened" event per pet.
// Ordering is decided by event timestamp, never by position in the input.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde_json::Value;
use tracing::trace;

use crate::error::CoreError;
use crate::model::{Event, Pet, UNKNOWN_PET_ID};

/// Latest open event per pet id.
///
/// Entries that are not `open` events are dropped. Events without a pet are
/// dropped too unless `include_unknown` is set, in which case they collapse
/// into one entry keyed [`UNKNOWN_PET_ID`] carrying the unknown-pet
/// placeholder; with no pet-less open events there is no such entry. For
/// each key a strictly later `date` replaces the held
/// event; on equal dates the first one seen is kept.
pub fn reconcile_pet_status(
    entries: &[Value],
    include_unknown: bool,
) -> Result<BTreeMap<String, Event>, CoreError> {
    let mut status: BTreeMap<String, Event> = BTreeMap::new();

    for raw in entries {
        let event = Event::from_value(raw)?;
        if !event.is_open() {
            continue;
        }

        let (key, event) = match &event.pet {
            Some(pet) => (pet.id.clone(), event),
            None if include_unknown => (
                UNKNOWN_PET_ID.to_owned(),
                event.with_pet(Pet::unknown_placeholder()),
            ),
            None => continue,
        };

        match status.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(event);
            }
            Entry::Occupied(mut slot) => {
                if event.date > slot.get().date {
                    trace!(pet = %slot.key(), id = event.id, "newer open event");
                    slot.insert(event);
                }
            }
        }
    }

    Ok(status)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::EventType;

    fn open(id: i64, date: &str, pet: Option<&str>) -> Value {
        let pet = pet.map(|p| json!({ "id": p, "name": p, "species": 0 }));
        json!({
            "id": id,
            "event_type": "open",
            "event_source": "rfid",
            "date": date,
            "properties": null,
            "pet": pet,
        })
    }

    fn close(id: i64, date: &str, pet: &str) -> Value {
        let mut v = open(id, date, Some(pet));
        v["event_type"] = json!("close");
        v
    }

    #[test]
    fn latest_timestamp_wins_regardless_of_order() {
        let entries = [
            open(1, "2023-03-01T08:00:00", Some("garfield")),
            open(2, "2023-03-01T18:30:00", Some("garfield")),
            open(3, "2023-03-01T12:00:00", Some("garfield")),
        ];
        let status = reconcile_pet_status(&entries, false).unwrap();
        assert_eq!(status.len(), 1);
        assert_eq!(status["garfield"].id, 2);
    }

    #[test]
    fn ties_keep_first_seen() {
        let entries = [
            open(1, "2023-03-01T08:00:00", Some("tom")),
            open(2, "2023-03-01T08:00:00", Some("tom")),
        ];
        let status = reconcile_pet_status(&entries, false).unwrap();
        assert_eq!(status["tom"].id, 1);
    }

    #[test]
    fn close_events_and_petless_events_are_dropped() {
        let entries = [
            close(1, "2023-03-01T09:00:00", "tom"),
            open(2, "2023-03-01T10:00:00", None),
            open(3, "2023-03-01T07:00:00", Some("garfield")),
        ];
        let status = reconcile_pet_status(&entries, false).unwrap();
        assert_eq!(status.keys().collect::<Vec<_>>(), ["garfield"]);
    }

    #[test]
    fn unknown_pet_is_synthesized_once() {
        let entries = [
            open(1, "2023-03-01T10:00:00", None),
            open(2, "2023-03-01T11:00:00", None),
            open(3, "2023-03-01T09:00:00", None),
            open(4, "2023-03-01T07:00:00", Some("garfield")),
        ];
        let status = reconcile_pet_status(&entries, true).unwrap();
        assert_eq!(status.len(), 2);

        let unknown = &status[UNKNOWN_PET_ID];
        assert_eq!(unknown.id, 2);
        assert_eq!(unknown.event_type, EventType::Open);
        assert!(unknown.pet.as_ref().unwrap().unknown);
    }

    #[test]
    fn no_unknown_entry_without_petless_events() {
        let entries = [
            open(1, "2023-03-01T07:00:00", Some("garfield")),
            open(2, "2023-03-01T09:00:00", Some("tom")),
        ];
        let status = reconcile_pet_status(&entries, true).unwrap();
        assert_eq!(status.keys().collect::<Vec<_>>(), ["garfield", "tom"]);
        assert!(!status.contains_key(UNKNOWN_PET_ID));
    }

    #[test]
    fn pet_map_without_id_is_kept() {
        let mut entry = open(1, "2023-03-01T07:00:00", None);
        entry["pet"] = json!({ "name": "Stray" });
        let status = reconcile_pet_status(&[entry], false).unwrap();
        assert_eq!(status[""].pet.as_ref().unwrap().name, "Stray");
    }

    #[test]
    fn invalid_entry_is_validation_error() {
        let entries = [json!({ "id": 1, "event_type": "open" })];
        assert!(matches!(
            reconcile_pet_status(&entries, false),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn empty_timeline() {
        assert!(reconcile_pet_status(&[], true).unwrap().is_empty());
    }
}
