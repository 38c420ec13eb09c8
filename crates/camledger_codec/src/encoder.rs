//! Deterministic CBOR writer.
//!
//! Output follows RFC 8949 §4.2.1: definite lengths, shortest argument
//! encoding, map entries ordered by encoded key (shorter first, then
//! bytewise) at every depth. Floats deviate from "preferred serialization"
//! on purpose: they are always written as binary64 so that a value never
//! changes width depending on its magnitude.
//!
//! The decoder's depth and size limits apply here too, so nothing is ever
//! written that cannot be read back.

use crate::decoder::{MAX_BYTES_LENGTH, MAX_CONTAINER_ELEMENTS, MAX_DEPTH};
use crate::error::{CodecError, CodecResult};
use crate::value::{canonical_float_bits, Value};
use std::cmp::Ordering;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;

const FALSE: u8 = 0xf4;
const TRUE: u8 = 0xf5;
const NULL: u8 = 0xf6;
const FLOAT64: u8 = 0xfb;

/// Encodes `value` to its canonical byte form.
///
/// # Errors
///
/// Returns [`CodecError::DuplicateKey`] if any map, at any depth, holds the
/// same key twice, and a size or nesting error for values the decoder would
/// refuse.
pub fn to_canonical_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// Appends canonical encodings to an output buffer.
///
/// Field-equal values produce identical bytes whatever order their map
/// entries were built in.
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    out: Vec<u8>,
}

impl CanonicalEncoder {
    /// Creates an empty encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the encoding of `value`.
    ///
    /// # Errors
    ///
    /// See [`to_canonical_cbor`]; the buffer contents are unspecified
    /// afterwards.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        self.value_at(value, 0)
    }

    fn value_at(&mut self, value: &Value, depth: usize) -> CodecResult<()> {
        if depth > MAX_DEPTH {
            return Err(CodecError::invalid_structure("nesting too deep"));
        }
        match value {
            Value::Null => self.out.push(NULL),
            Value::Bool(false) => self.out.push(FALSE),
            Value::Bool(true) => self.out.push(TRUE),
            Value::Integer(n) if *n >= 0 => self.head(MAJOR_UNSIGNED, n.unsigned_abs()),
            // -1 - n, which is in range for every negative i64.
            Value::Integer(n) => self.head(MAJOR_NEGATIVE, (n + 1).unsigned_abs()),
            Value::Float(f) => {
                self.out.push(FLOAT64);
                self.out
                    .extend_from_slice(&canonical_float_bits(*f).to_be_bytes());
            }
            Value::Bytes(bytes) => {
                self.head(MAJOR_BYTES, within(bytes.len(), MAX_BYTES_LENGTH)?);
                self.out.extend_from_slice(bytes);
            }
            Value::Text(text) => {
                self.head(MAJOR_TEXT, within(text.len(), MAX_BYTES_LENGTH)?);
                self.out.extend_from_slice(text.as_bytes());
            }
            Value::Array(items) => {
                self.head(MAJOR_ARRAY, within(items.len(), MAX_CONTAINER_ELEMENTS)?);
                for item in items {
                    self.value_at(item, depth + 1)?;
                }
            }
            Value::Map(entries) => self.map(entries, depth)?,
        }
        Ok(())
    }

    /// Bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    /// Finishes, returning the written bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    /// Writes an initial byte plus the shortest argument for `arg`.
    #[allow(clippy::cast_possible_truncation)]
    fn head(&mut self, major: u8, arg: u64) {
        let major = major << 5;
        match arg {
            0..=23 => self.out.push(major | arg as u8),
            24..=0xff => self.out.extend_from_slice(&[major | 24, arg as u8]),
            0x100..=0xffff => {
                self.out.push(major | 25);
                self.out.extend_from_slice(&(arg as u16).to_be_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                self.out.push(major | 26);
                self.out.extend_from_slice(&(arg as u32).to_be_bytes());
            }
            _ => {
                self.out.push(major | 27);
                self.out.extend_from_slice(&arg.to_be_bytes());
            }
        }
    }

    fn map(&mut self, entries: &[(Value, Value)], depth: usize) -> CodecResult<()> {
        let len = within(entries.len(), MAX_CONTAINER_ELEMENTS)?;
        let mut keyed = entries
            .iter()
            .map(|(k, v)| -> CodecResult<_> {
                let mut key = CanonicalEncoder::new();
                key.value_at(k, depth + 1)?;
                Ok((key.out, v))
            })
            .collect::<CodecResult<Vec<_>>>()?;
        keyed.sort_by(|(a, _), (b, _)| compare_encoded_keys(a, b));
        if keyed.windows(2).any(|pair| pair[0].0 == pair[1].0) {
            return Err(CodecError::DuplicateKey);
        }

        self.head(MAJOR_MAP, len);
        for (key, value) in keyed {
            self.out.extend_from_slice(&key);
            self.value_at(value, depth + 1)?;
        }
        Ok(())
    }
}

/// `len` as a CBOR argument, if the decoder would accept it.
fn within(len: usize, max: u64) -> CodecResult<u64> {
    let claimed = len as u64;
    if claimed > max {
        return Err(CodecError::SizeLimitExceeded {
            claimed,
            max_allowed: max,
        });
    }
    Ok(claimed)
}

/// Canonical order of two encoded map keys: shorter first, then bytewise.
pub(crate) fn compare_encoded_keys(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
