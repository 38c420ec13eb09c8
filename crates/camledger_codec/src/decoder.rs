//! Strict reader for canonical CBOR.
//!
//! Anything the encoder would not have produced is rejected, so accepted
//! input always re-encodes byte for byte.

use crate::encoder::compare_encoded_keys;
use crate::error::{CodecError, CodecResult};
use crate::value::{Value, CANONICAL_NAN_BITS};
use std::cmp::Ordering;

/// Reads exactly one value spanning all of `bytes`.
///
/// # Errors
///
/// Fails on truncated, trailing or non-canonical input.
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = CanonicalDecoder::new(bytes);
    let value = decoder.decode()?;
    if !decoder.is_empty() {
        return Err(CodecError::TrailingBytes {
            remaining: decoder.remaining().len(),
        });
    }
    Ok(value)
}

/// Cursor over a byte slice yielding canonical values.
pub struct CanonicalDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

/// Largest array or map accepted.
pub const MAX_CONTAINER_ELEMENTS: u64 = 1024 * 1024;

/// Largest byte or text string accepted.
pub const MAX_BYTES_LENGTH: u64 = 64 * 1024 * 1024;

/// Deepest container nesting accepted; the top-level value is depth 0.
pub const MAX_DEPTH: usize = 64;

impl<'a> CanonicalDecoder<'a> {
    /// Starts at the first byte of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Reads the next value.
    ///
    /// # Errors
    ///
    /// See [`from_cbor`].
    pub fn decode(&mut self) -> CodecResult<Value> {
        self.value_at(0)
    }

    /// `true` once every byte has been read.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Unread input.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    fn value_at(&mut self, depth: usize) -> CodecResult<Value> {
        if depth > MAX_DEPTH {
            return Err(CodecError::invalid_structure("nesting too deep"));
        }

        let initial = self.read_byte()?;
        let major = initial >> 5;
        let info = initial & 0x1f;

        match major {
            0 => {
                let n = self.argument(info)?;
                i64::try_from(n)
                    .map(Value::Integer)
                    .map_err(|_| CodecError::invalid_structure("integer out of range"))
            }
            1 => {
                let n = self.argument(info)?;
                i64::try_from(n)
                    .map(|n| Value::Integer(-n - 1))
                    .map_err(|_| CodecError::invalid_structure("integer out of range"))
            }
            2 => {
                let bytes = self.payload(info)?;
                Ok(Value::Bytes(bytes.to_vec()))
            }
            3 => {
                let bytes = self.payload(info)?;
                let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
                Ok(Value::Text(text.to_string()))
            }
            4 => self.array(info, depth),
            5 => self.map_entries(info, depth),
            6 => Err(CodecError::unsupported_type("tagged value")),
            _ => self.simple(info),
        }
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn argument(&mut self, info: u8) -> CodecResult<u64> {
        let (value, shorter_fits) = match info {
            0..=23 => return Ok(u64::from(info)),
            24 => {
                let v = u64::from(self.read_byte()?);
                (v, v < 24)
            }
            25 => {
                let v = u64::from(u16::from_be_bytes(self.read_array()?));
                (v, v <= u64::from(u8::MAX))
            }
            26 => {
                let v = u64::from(u32::from_be_bytes(self.read_array()?));
                (v, v <= u64::from(u16::MAX))
            }
            27 => {
                let v = u64::from_be_bytes(self.read_array()?);
                (v, v <= u64::from(u32::MAX))
            }
            31 => return Err(CodecError::IndefiniteLengthForbidden),
            _ => return Err(CodecError::invalid_structure("reserved additional info")),
        };

        if shorter_fits {
            return Err(CodecError::invalid_structure(
                "non-canonical: value could be encoded in fewer bytes",
            ));
        }
        Ok(value)
    }

    fn length(&mut self, info: u8, max: u64) -> CodecResult<usize> {
        let claimed = self.argument(info)?;
        if claimed > max {
            return Err(CodecError::SizeLimitExceeded {
                claimed,
                max_allowed: max,
            });
        }
        usize::try_from(claimed).map_err(|_| CodecError::SizeLimitExceeded {
            claimed,
            max_allowed: max,
        })
    }

    fn payload(&mut self, info: u8) -> CodecResult<&'a [u8]> {
        let len = self.length(info, MAX_BYTES_LENGTH)?;
        self.read_bytes(len)
    }

    fn array(&mut self, info: u8, depth: usize) -> CodecResult<Value> {
        let len = self.length(info, MAX_CONTAINER_ELEMENTS)?;
        // Every element takes at least one byte.
        let mut items = Vec::with_capacity(len.min(self.remaining().len()));
        for _ in 0..len {
            items.push(self.value_at(depth + 1)?);
        }
        Ok(Value::Array(items))
    }

    fn map_entries(&mut self, info: u8, depth: usize) -> CodecResult<Value> {
        let len = self.length(info, MAX_CONTAINER_ELEMENTS)?;
        let mut pairs = Vec::with_capacity(len.min(self.remaining().len() / 2));
        let mut prev_key: Option<&'a [u8]> = None;

        for _ in 0..len {
            let key_start = self.pos;
            let key = self.value_at(depth + 1)?;
            let data = self.data;
            let key_bytes = &data[key_start..self.pos];

            if let Some(prev) = prev_key {
                match compare_encoded_keys(prev, key_bytes) {
                    Ordering::Less => {}
                    Ordering::Equal => return Err(CodecError::DuplicateKey),
                    Ordering::Greater => {
                        return Err(CodecError::invalid_structure(
                            "non-canonical: map keys not in sorted order",
                        ))
                    }
                }
            }
            prev_key = Some(key_bytes);

            let value = self.value_at(depth + 1)?;
            pairs.push((key, value));
        }

        Ok(Value::Map(pairs))
    }

    fn simple(&mut self, info: u8) -> CodecResult<Value> {
        match info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            25 | 26 => Err(CodecError::NonCanonicalFloat),
            27 => {
                let bits = u64::from_be_bytes(self.read_array()?);
                let f = f64::from_bits(bits);
                if f.is_nan() && bits != CANONICAL_NAN_BITS {
                    return Err(CodecError::NonCanonicalFloat);
                }
                Ok(Value::Float(f))
            }
            31 => Err(CodecError::invalid_structure("break without indefinite")),
            _ => Err(CodecError::unsupported_type(format!(
                "simple value {info}"
            ))),
        }
    }
}
