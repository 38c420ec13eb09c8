//! # camledger codec
//!
//! The single byte format for world-state records.
//!
//! Every node executing a transaction has to store bit-identical bytes for
//! the same logical record, so records are written as deterministic CBOR
//! (RFC 8949 §4.2.1) with one deviation for floats:
//!
//! - map keys ordered by encoded length, then bytewise, at every depth
//! - repeated map keys are an error
//! - integers and lengths in their shortest form
//! - floats always binary64, NaN always `0x7ff8000000000000`
//! - text is UTF-8; no indefinite lengths, tags or other simple values
//!
//! ## Usage
//!
//! ```
//! use camledger_codec::{to_canonical_cbor, from_cbor, Value};
//!
//! let a = Value::from_fields([("a", Value::Integer(1)), ("b", Value::Integer(2))]);
//! let b = Value::from_fields([("b", Value::Integer(2)), ("a", Value::Integer(1))]);
//! assert_eq!(to_canonical_cbor(&a).unwrap(), to_canonical_cbor(&b).unwrap());
//!
//! let decoded = from_cbor(&to_canonical_cbor(&a).unwrap()).unwrap();
//! assert_eq!(decoded, a);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod json;
mod value;

pub use decoder::{
    from_cbor, CanonicalDecoder, MAX_BYTES_LENGTH, MAX_CONTAINER_ELEMENTS, MAX_DEPTH,
};
pub use encoder::{to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use json::from_json_str;
pub use value::{canonical_float_bits, Value, CANONICAL_NAN_BITS};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            any::<f64>().prop_map(Value::Float),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::Text),
            prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
        ]
    }

    /// Text-keyed fields with unique keys, as records have.
    fn fields() -> impl Strategy<Value = Vec<(String, Value)>> {
        let value = leaf().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(|m| {
                    Value::Map(m.into_iter().map(|(k, v)| (Value::Text(k), v)).collect())
                }),
            ]
        });
        prop::collection::btree_map("[a-zA-Z]{1,10}", value, 0..8)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn field_order_never_changes_bytes(fields in fields(), seed in any::<u64>()) {
            let forward = Value::Map(
                fields.iter().map(|(k, v)| (Value::Text(k.clone()), v.clone())).collect(),
            );
            let mut shuffled: Vec<_> = fields.clone();
            // Deterministic permutation driven by the seed.
            let len = shuffled.len().max(1);
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();
            let backward = Value::Map(
                shuffled.into_iter().map(|(k, v)| (Value::Text(k), v)).collect(),
            );

            prop_assert_eq!(
                to_canonical_cbor(&forward).unwrap(),
                to_canonical_cbor(&backward).unwrap()
            );
        }

        #[test]
        fn decode_accepts_every_encoding(fields in fields()) {
            let value = Value::Map(
                fields.into_iter().map(|(k, v)| (Value::Text(k), v)).collect(),
            );
            let bytes = to_canonical_cbor(&value).unwrap();
            let decoded = from_cbor(&bytes).unwrap();
            prop_assert_eq!(to_canonical_cbor(&decoded).unwrap(), bytes);
        }
    }

    #[test]
    fn insertion_order_is_irrelevant() {
        let a = Value::Map(vec![
            (Value::from("a"), Value::Integer(1)),
            (Value::from("b"), Value::Integer(2)),
        ]);
        let b = Value::Map(vec![
            (Value::from("b"), Value::Integer(2)),
            (Value::from("a"), Value::Integer(1)),
        ]);
        assert_eq!(to_canonical_cbor(&a).unwrap(), to_canonical_cbor(&b).unwrap());
    }
}
