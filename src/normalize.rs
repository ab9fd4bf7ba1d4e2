//! Field-level response normalization for the Meraki Dashboard API.
//!
//! The Dashboard API returns `null` for fields its own published schema
//! declares as strings or arrays (firmware upgrade timestamps, network
//! tags, device LAN IPs, ...). Rather than loosening validation globally,
//! the Meraki client coerces exactly the known-offender fields as a
//! documented transform step: `null -> ""` and `null -> []`.

use serde_json::Value;

/// Fields the upstream nulls out despite declaring them as strings.
/// Covers the firmware-upgrade, network, and device payload families.
const NULL_TO_STRING: &[&str] = &[
    // firmware upgrades
    "completedAt",
    "time",
    "status",
    "upgradeId",
    "upgradeBatchId",
    "version",
    "firmware",
    "releaseDate",
    "shortName",
    // networks
    "name",
    "timeZone",
    "notes",
    "enrollmentString",
    "url",
    // devices
    "lanIp",
    "address",
    "serial",
    "mac",
];

/// Fields declared as arrays that arrive as `null`.
const NULL_TO_ARRAY: &[&str] = &["tags", "productTypes"];

/// Recursively coerce known null fields in a Meraki response body.
pub fn meraki_nulls(value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                meraki_nulls(item);
            }
        }
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if field.is_null() {
                    if NULL_TO_STRING.contains(&key.as_str()) {
                        *field = Value::String(String::new());
                    } else if NULL_TO_ARRAY.contains(&key.as_str()) {
                        *field = Value::Array(Vec::new());
                    }
                } else {
                    meraki_nulls(field);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn firmware_upgrade_nulls_become_empty_strings() {
        let mut body = json!([{
            "upgradeId": null,
            "completedAt": null,
            "status": "in-progress",
            "network": { "id": "N_1", "name": null }
        }]);
        meraki_nulls(&mut body);
        assert_eq!(body[0]["upgradeId"], "");
        assert_eq!(body[0]["completedAt"], "");
        assert_eq!(body[0]["status"], "in-progress");
        assert_eq!(body[0]["network"]["name"], "");
    }

    #[test]
    fn null_tags_become_empty_array() {
        let mut body = json!([{ "name": "lab", "tags": null, "productTypes": null }]);
        meraki_nulls(&mut body);
        assert_eq!(body[0]["tags"], json!([]));
        assert_eq!(body[0]["productTypes"], json!([]));
    }

    #[test]
    fn unknown_null_fields_pass_through() {
        let mut body = json!({ "somethingElse": null });
        meraki_nulls(&mut body);
        assert_eq!(body["somethingElse"], Value::Null);
    }

    #[test]
    fn nested_version_objects_are_coerced() {
        let mut body = json!([{
            "toVersion": { "version": null, "releaseDate": null, "shortName": "wireless-29-5" }
        }]);
        meraki_nulls(&mut body);
        assert_eq!(body[0]["toVersion"]["version"], "");
        assert_eq!(body[0]["toVersion"]["releaseDate"], "");
        assert_eq!(body[0]["toVersion"]["shortName"], "wireless-29-5");
    }

    #[test]
    fn non_null_values_are_untouched() {
        let mut body = json!({ "name": "core-sw", "tags": ["a", "b"] });
        let expected = body.clone();
        meraki_nulls(&mut body);
        assert_eq!(body, expected);
    }
}
