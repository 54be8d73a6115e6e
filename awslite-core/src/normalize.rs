//! Singleton-vs-array smoothing for query-protocol (XML) responses.
//!
//! XML has no list type: a one-element list decodes as a bare object, a list
//! usually sits under a `member` wrapper, and an empty list decodes as `""`.
//! Descriptors declare which keys are array-typed and this pass rewrites every
//! occurrence of those keys, at any depth, into a JSON array.

use serde_json::Value as JsonValue;

/// Coerce a decoded value into a list: arrays pass through, `{ "member": x }` is
/// unwrapped, `null` and `""` become empty, anything else becomes one element.
pub fn into_list(value: JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(items) => items,
        JsonValue::Null => Vec::new(),
        JsonValue::String(s) if s.is_empty() => Vec::new(),
        JsonValue::Object(mut map) if map.len() == 1 && map.contains_key("member") => {
            map.remove("member").map(into_list).unwrap_or_default()
        }
        other => vec![other],
    }
}

/// Rewrite every present key named in `array_keys` into an array, recursively.
///
/// Keys in `top_level` that are missing from the top-level object are inserted as
/// empty arrays. Nested objects never gain keys.
pub fn normalize_object_arrays(value: &mut JsonValue, array_keys: &[&str], top_level: &[&str]) {
    if let JsonValue::Object(map) = value {
        for key in top_level {
            map.entry(*key)
                .or_insert_with(|| JsonValue::Array(Vec::new()));
        }
    }
    coerce(value, array_keys);
}

fn coerce(value: &mut JsonValue, array_keys: &[&str]) {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map.iter_mut() {
                if array_keys.contains(&key.as_str()) {
                    let taken = std::mem::take(child);
                    *child = JsonValue::Array(into_list(taken));
                }
                coerce(child, array_keys);
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                coerce(item, array_keys);
            }
        }
        _ => {}
    }
}
