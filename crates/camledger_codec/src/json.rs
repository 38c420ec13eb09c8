//! Bridges between [`Value`] and JSON.
//!
//! Callers hand structured arguments over as JSON text, and gateways relay
//! records back as JSON; the canonical CBOR form stays the only thing ever
//! written to the world state.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    // Above i64::MAX: only representable as a float.
                    Value::Float(u as f64)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::map(
                fields
                    .into_iter()
                    .map(|(k, v)| (Value::Text(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Parse JSON text into a [`Value`].
///
/// # Errors
///
/// Returns [`CodecError::InvalidInput`] if `text` is not well-formed JSON.
pub fn from_json_str(text: &str) -> CodecResult<Value> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from)
        .map_err(|e| CodecError::invalid_input(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_object_becomes_sorted_map() {
        let value = from_json_str(r#"{"resolution":"1080p","fps":30,"ratio":0.5}"#).unwrap();

        assert_eq!(value.get("resolution"), Some(&Value::from("1080p")));
        assert_eq!(value.get("fps"), Some(&Value::Integer(30)));
        assert_eq!(value.get("ratio"), Some(&Value::Float(0.5)));

        let keys: Vec<_> = value
            .as_map()
            .unwrap()
            .iter()
            .filter_map(|(k, _)| k.as_text())
            .collect();
        assert_eq!(keys, vec!["fps", "ratio", "resolution"]);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            from_json_str("{not json"),
            Err(CodecError::InvalidInput { .. })
        ));
    }

    #[test]
    fn value_serializes_to_json() {
        let value = Value::from_fields([
            ("approved", Value::Bool(true)),
            ("duration", Value::Float(2.5)),
            ("cameraID", Value::from("CAM-1")),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"approved":true,"cameraID":"CAM-1","duration":2.5}"#);
    }
}
