use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value as JsonValue};

use crate::error::PaginationError;

/// A `.`-separated lookup path such as `ListUsersResult.Marker`.
///
/// Numeric segments index into arrays. Lookups never modify the value they read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedPath {
    raw: String,
    segments: Vec<String>,
}

impl DottedPath {
    pub fn parse(raw: &str) -> Result<Self, PaginationError> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(PaginationError::EmptySegment {
                path: raw.to_string(),
            });
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn lookup<'a>(&self, value: &'a JsonValue) -> Option<&'a JsonValue> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match current {
                JsonValue::Object(map) => map.get(segment),
                JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// Set the value at this path, creating intermediate objects as needed.
    /// Returns false when an intermediate value is a scalar and cannot hold children.
    pub fn replace(&self, target: &mut JsonValue, new_value: JsonValue) -> bool {
        let Some((last, parents)) = self.segments.split_last() else {
            return false;
        };
        let mut current = target;
        for segment in parents {
            make_container(current);
            current = match current {
                JsonValue::Object(map) => map
                    .entry(segment.clone())
                    .or_insert(JsonValue::Null),
                JsonValue::Array(items) => {
                    match segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                        Some(item) => item,
                        None => return false,
                    }
                }
                _ => return false,
            };
        }
        make_container(current);
        match current.as_object_mut() {
            Some(map) => {
                map.insert(last.clone(), new_value);
                true
            }
            None => false,
        }
    }
}

// Absent values and empty XML elements ("") can be replaced by an object.
fn make_container(value: &mut JsonValue) {
    if value.is_null() || value.as_str() == Some("") {
        *value = JsonValue::Object(Map::new());
    }
}

impl FromStr for DottedPath {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
