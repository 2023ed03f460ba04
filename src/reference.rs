// Reference dict - `{"<type_key>": "<id>"}`
//
// The only persisted shape of a reference. The struct holds exactly one
// (type_key, id) pair; raw JSON is checked for that shape when parsed.

use crate::error::{ReferenceError, Result};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceDict {
    type_key: String,
    id: String,
}

impl ReferenceDict {
    pub fn new(type_key: impl Into<String>, id: impl Into<String>) -> Self {
        ReferenceDict {
            type_key: type_key.into(),
            id: id.into(),
        }
    }

    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parse a JSON object holding exactly one string-valued entry
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        if map.len() != 1 {
            return Err(ReferenceError::MalformedReference(format!(
                "expected exactly one key, got {} in {}",
                map.len(),
                Value::Object(map.clone())
            )));
        }

        let Some((type_key, id)) = map.iter().next() else {
            return Err(ReferenceError::MalformedReference("empty map".to_string()));
        };

        match id {
            Value::String(id) => Ok(ReferenceDict::new(type_key.clone(), id.clone())),
            other => Err(ReferenceError::MalformedReference(format!(
                "id for '{}' must be a string, got {}",
                type_key, other
            ))),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(ReferenceError::MalformedReference(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(1);
        map.insert(self.type_key.clone(), Value::String(self.id.clone()));
        Value::Object(map)
    }
}

impl fmt::Display for ReferenceDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl TryFrom<&Value> for ReferenceDict {
    type Error = ReferenceError;

    fn try_from(value: &Value) -> Result<Self> {
        ReferenceDict::from_value(value)
    }
}

impl TryFrom<Value> for ReferenceDict {
    type Error = ReferenceError;

    fn try_from(value: Value) -> Result<Self> {
        ReferenceDict::from_value(&value)
    }
}

impl Serialize for ReferenceDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.type_key, &self.id)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for ReferenceDict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        ReferenceDict::from_map(&map).map_err(D::Error::custom)
    }
}
