// ── Wire-to-domain conversions ──
//
// Fixed-path navigation into the raw JSON the device and the cloud return.
// A missing index or key at the expected position is an invalid response,
// never a silent default.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use petwalk_api::local::wire_to_value;

use crate::error::CoreError;
use crate::model::Pet;

// ── Local API ───────────────────────────────────────────────────────

/// Normalize a raw field map into booleans. Later maps override earlier ones.
pub fn normalize_api_data<'a>(
    maps: impl IntoIterator<Item = &'a Map<String, Value>>,
) -> Result<BTreeMap<String, bool>, CoreError> {
    let mut merged = BTreeMap::new();
    for map in maps {
        for (key, raw) in map {
            merged.insert(key.clone(), wire_to_value(key, raw)?);
        }
    }
    Ok(merged)
}

/// Read and normalize one field from a raw field map.
pub fn field_value(map: &Map<String, Value>, field: &str) -> Result<bool, CoreError> {
    let raw = map.get(field).ok_or_else(|| {
        debug!(field, "field missing from local API response");
        CoreError::invalid_response(format!("{field} not found in response"))
    })?;
    Ok(wire_to_value(field, raw)?)
}

// ── DeviceInfo ──────────────────────────────────────────────────────

/// `responses[0].DeviceInfo[0]`
pub fn device_info_record(info: &Value) -> Result<&Map<String, Value>, CoreError> {
    info.get("responses")
        .and_then(|r| r.get(0))
        .and_then(|r| r.get("DeviceInfo"))
        .and_then(|d| d.get(0))
        .and_then(Value::as_object)
        .ok_or_else(|| CoreError::invalid_response("responses[0].DeviceInfo[0] not found"))
}

fn device_info_str<'a>(info: &'a Value, key: &str) -> Result<&'a str, CoreError> {
    device_info_record(info)?
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::invalid_response(format!("DeviceInfo.{key} not found")))
}

pub fn device_name(info: &Value) -> Result<String, CoreError> {
    device_info_str(info, "device_name").map(str::to_owned)
}

pub fn serial_number(info: &Value) -> Result<String, CoreError> {
    device_info_str(info, "serial").map(str::to_owned)
}

/// Firmware version without its leading component: `"0.1.20"` → `"1.20"`.
pub fn sw_version(info: &Value) -> Result<String, CoreError> {
    let raw = device_info_str(info, "sw_version")?;
    raw.split_once('.')
        .map(|(_, rest)| rest.to_owned())
        .ok_or_else(|| CoreError::invalid_response(format!("unexpected sw_version '{raw}'")))
}

/// Registered pets from the DeviceInfo roster, skipping unused slots.
pub fn available_pets(info: &Value, include_unknown: bool) -> Result<Vec<Pet>, CoreError> {
    let roster = device_info_record(info)?
        .get("pets")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::invalid_response("DeviceInfo.pets not found"))?;

    let mut pets = Vec::with_capacity(roster.len() + 1);
    for entry in roster {
        let fields = entry
            .as_array()
            .ok_or_else(|| CoreError::invalid_response(format!("malformed pet entry {entry}")))?;
        let pet = Pet::from_roster_entry(fields)
            .map_err(|e| CoreError::invalid_response(format!("malformed pet entry: {e}")))?;
        pets.extend(pet);
    }

    if include_unknown {
        pets.push(Pet::unknown_placeholder());
    }
    Ok(pets)
}

// ── Cloud ───────────────────────────────────────────────────────────

/// `update_states[0].deviceId`, as an integer or a numeric string.
pub fn device_id(update_info: &Value) -> Result<i64, CoreError> {
    let raw = update_info
        .get("update_states")
        .and_then(|s| s.get(0))
        .and_then(|s| s.get("deviceId"))
        .ok_or_else(|| CoreError::invalid_response("update_states[0].deviceId not found"))?;

    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| CoreError::invalid_response(format!("deviceId {raw} is not an integer")))
}

/// The timeline payload as a list of raw entries.
pub fn timeline_entries(timeline: &Value) -> Result<&[Value], CoreError> {
    timeline
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| CoreError::invalid_response("timeline is not a list"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn device_info() -> Value {
        json!({
            "request-id": "0b482bd5-c990-4892-ad05-fbb4b5a0ef0e",
            "responses": [{
                "DeviceInfo": [{
                    "device_name": "pw_clb_v2_12345A67B8900000",
                    "serial": "12345A67B8900000",
                    "sw_version": "0.1.20",
                    "pets": [
                        ["d1c87845", "Garfield", "cat", {"in": "default", "out": "default"}, 1_651_098_738, null],
                        ["00000000", null, null, null, null, null],
                        ["edd68702", "Tom", "cat", {"in": "default", "out": "default"}, 1_651_098_739, null]
                    ]
                }]
            }],
            "version": "2.0.0"
        })
    }

    #[test]
    fn device_metadata() {
        let info = device_info();
        assert_eq!(device_name(&info).unwrap(), "pw_clb_v2_12345A67B8900000");
        assert_eq!(serial_number(&info).unwrap(), "12345A67B8900000");
        assert_eq!(sw_version(&info).unwrap(), "1.20");
    }

    #[test]
    fn sw_version_without_dot_is_invalid() {
        let mut info = device_info();
        info["responses"][0]["DeviceInfo"][0]["sw_version"] = json!("120");
        assert!(matches!(sw_version(&info), Err(CoreError::InvalidResponse { .. })));
    }

    #[test]
    fn missing_paths_are_invalid_response() {
        for info in [
            json!({}),
            json!({ "responses": [] }),
            json!({ "responses": [{ "DeviceInfo": [] }] }),
            json!({ "responses": [{ "DeviceInfo": [{}] }] }),
        ] {
            assert!(
                matches!(device_name(&info), Err(CoreError::InvalidResponse { .. })),
                "{info}"
            );
        }
    }

    #[test]
    fn pets_skip_empty_slots() {
        let pets = available_pets(&device_info(), false).unwrap();
        let names: Vec<_> = pets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Garfield", "Tom"]);
    }

    #[test]
    fn unknown_pet_is_appended_once() {
        let pets = available_pets(&device_info(), true).unwrap();
        assert_eq!(pets.len(), 3);
        assert_eq!(pets.iter().filter(|p| p.unknown).count(), 1);
        assert_eq!(pets.last().unwrap(), &Pet::unknown_placeholder());
    }

    #[test]
    fn device_id_accepts_integer_and_numeric_string() {
        assert_eq!(device_id(&json!({"update_states": [{"deviceId": 1234}]})).unwrap(), 1234);
        assert_eq!(device_id(&json!({"update_states": [{"deviceId": "1234"}]})).unwrap(), 1234);
        assert!(device_id(&json!({"update_states": []})).is_err());
        assert!(device_id(&json!({"update_states": [{"deviceId": "abc"}]})).is_err());
    }

    #[test]
    fn normalization_lets_later_maps_win() {
        let modes = json!({"rfid": true, "door": "closed"});
        let states = json!({"door": "open", "system": "off"});
        let merged =
            normalize_api_data([modes.as_object().unwrap(), states.as_object().unwrap()]).unwrap();
        assert!(merged["rfid"]);
        assert!(merged["door"]);
        assert!(!merged["system"]);
    }

    #[test]
    fn normalization_rejects_unmapped_values() {
        let modes = json!({"rfid": "maybe"});
        assert!(matches!(
            normalize_api_data([modes.as_object().unwrap()]),
            Err(CoreError::InvalidResponseValue { .. })
        ));
    }

    #[test]
    fn field_value_requires_presence() {
        let map = json!({"door": "open"});
        let map = map.as_object().unwrap();
        assert!(field_value(map, "door").unwrap());
        assert!(matches!(
            field_value(map, "system"),
            Err(CoreError::InvalidResponse { .. })
        ));
    }
}
