//! In-memory form of a world-state document.

use std::cmp::Ordering;

/// Bit pattern every NaN is normalised to before encoding.
pub const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

/// A decoded document, or one about to be encoded.
///
/// Floats have exactly one encoding (binary64, a single NaN), and `==`
/// follows it: any two NaNs are equal while `0.0 != -0.0`.
#[derive(Debug, Clone)]
pub enum Value {
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// Any i64.
    Integer(i64),
    /// Binary64 float.
    Float(f64),
    /// Byte string.
    Bytes(Vec<u8>),
    /// UTF-8 text.
    Text(String),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Entries; the encoder reorders them, so construction order is free.
    Map(Vec<(Value, Value)>),
}

/// Bits used on the wire for `f`.
#[inline]
#[must_use]
pub fn canonical_float_bits(f: f64) -> u64 {
    if f.is_nan() {
        CANONICAL_NAN_BITS
    } else {
        f.to_bits()
    }
}

/// Length of a CBOR head carrying `arg`.
const fn head_len(arg: u64) -> usize {
    match arg {
        0..=23 => 1,
        24..=0xff => 2,
        0x100..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::{Array, Bool, Bytes, Float, Integer, Map, Null, Text};
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => canonical_float_bits(*a) == canonical_float_bits(*b),
            (Bytes(a), Bytes(b)) => a == b,
            (Text(a), Text(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Map with entries already in canonical key order.
    pub fn map(mut entries: Vec<(Value, Value)>) -> Self {
        entries.sort_by(|(a, _), (b, _)| a.cmp_canonical(b));
        Value::Map(entries)
    }

    /// Map keyed by field names, the usual record shape.
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        Self::map(
            fields
                .into_iter()
                .map(|(name, value)| (Value::from(name), value))
                .collect(),
        )
    }

    /// `{}`.
    #[must_use]
    pub fn empty_map() -> Self {
        Value::Map(Vec::new())
    }

    /// Orders two values the way their canonical encodings compare:
    /// shorter encoding first, then bytewise.
    ///
    /// Only exact for scalars, which is all map keys ever are here;
    /// containers fall back to element-wise comparison.
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        self.initial_byte()
            .cmp(&other.initial_byte())
            .then_with(|| match (self, other) {
                (Value::Integer(a), Value::Integer(b)) => {
                    let (a, b) = (Self::integer_arg(*a), Self::integer_arg(*b));
                    head_len(a).cmp(&head_len(b)).then(a.cmp(&b))
                }
                (Value::Bytes(a), Value::Bytes(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
                (Value::Text(a), Value::Text(b)) => {
                    a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes()))
                }
                (Value::Array(a), Value::Array(b)) => a.len().cmp(&b.len()).then_with(|| {
                    a.iter()
                        .zip(b)
                        .map(|(x, y)| x.cmp_canonical(y))
                        .find(|o| o.is_ne())
                        .unwrap_or(Ordering::Equal)
                }),
                (Value::Map(a), Value::Map(b)) => a.len().cmp(&b.len()).then_with(|| {
                    a.iter()
                        .zip(b)
                        .map(|((xk, xv), (yk, yv))| {
                            xk.cmp_canonical(yk).then_with(|| xv.cmp_canonical(yv))
                        })
                        .find(|o| o.is_ne())
                        .unwrap_or(Ordering::Equal)
                }),
                (Value::Float(a), Value::Float(b)) => {
                    canonical_float_bits(*a).cmp(&canonical_float_bits(*b))
                }
                _ => Ordering::Equal,
            })
    }

    /// Argument of an integer head; negatives carry `-1 - n`.
    fn integer_arg(n: i64) -> u64 {
        if n >= 0 {
            n.unsigned_abs()
        } else {
            (n + 1).unsigned_abs()
        }
    }

    /// Major type in the high bits; simple values and floats use their
    /// full initial byte, which already orders them.
    fn initial_byte(&self) -> u8 {
        match self {
            Value::Integer(n) if *n >= 0 => 0x00,
            Value::Integer(_) => 0x20,
            Value::Bytes(_) => 0x40,
            Value::Text(_) => 0x60,
            Value::Array(_) => 0x80,
            Value::Map(_) => 0xa0,
            Value::Bool(false) => 0xf4,
            Value::Bool(true) => 0xf5,
            Value::Null => 0xf6,
            Value::Float(_) => 0xfb,
        }
    }

    /// Levels of containers below this value: 0 for scalars and empty
    /// containers, 1 for a container of scalars.
    pub fn nesting(&self) -> usize {
        fn deepest<'a>(children: impl Iterator<Item = &'a Value>) -> usize {
            children.map(|child| child.nesting() + 1).max().unwrap_or(0)
        }
        match self {
            Value::Array(items) => deepest(items.iter()),
            Value::Map(entries) => deepest(entries.iter().flat_map(|(k, v)| [k, v])),
            _ => 0,
        }
    }

    /// `true` for `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// The integer, if this is one.
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    /// Numeric value; integers are widened so `30` and `30.0` read alike.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float(f) => Some(f),
            Value::Integer(n) => Some(n as f64),
            _ => None,
        }
    }

    /// Contents of a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let Value::Bytes(b) = self {
            Some(b)
        } else {
            None
        }
    }

    /// Contents of a text string.
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Elements of an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        if let Value::Array(items) = self {
            Some(items)
        } else {
            None
        }
    }

    /// Entries of a map.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        if let Value::Map(entries) = self {
            Some(entries)
        } else {
            None
        }
    }

    /// Field `key` of a map; `None` for missing keys and non-maps.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find_map(|(k, v)| (k.as_text() == Some(key)).then_some(v))
    }
}

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )*
    };
}

value_from! {
    bool => |b| Value::Bool(b),
    i64 => |n| Value::Integer(n),
    i32 => |n| Value::Integer(i64::from(n)),
    u32 => |n| Value::Integer(i64::from(n)),
    f64 => |f| Value::Float(f),
    String => |s| Value::Text(s),
    &str => |s| Value::Text(s.to_owned()),
    Vec<u8> => |b| Value::Bytes(b),
    &[u8] => |b| Value::Bytes(b.to_vec()),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_keys_are_sorted() {
        let map = Value::map(vec![
            (Value::Text("z".to_string()), Value::Integer(1)),
            (Value::Text("a".to_string()), Value::Integer(2)),
            (Value::Text("m".to_string()), Value::Integer(3)),
        ]);

        if let Value::Map(pairs) = map {
            assert_eq!(pairs[0].0, Value::Text("a".to_string()));
            assert_eq!(pairs[1].0, Value::Text("m".to_string()));
            assert_eq!(pairs[2].0, Value::Text("z".to_string()));
        } else {
            panic!("Expected Map");
        }
    }

    #[test]
    fn map_key_length_ordering() {
        // Shorter keys come first in canonical CBOR
        let map = Value::from_fields([
            ("status", Value::Integer(1)),
            ("model", Value::Integer(2)),
            ("deviceID", Value::Integer(3)),
        ]);

        let keys: Vec<_> = map
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_text().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["model", "status", "deviceID"]);
    }

    #[test]
    fn integer_ordering() {
        let mut sorted = vec![
            Value::Integer(-1),
            Value::Integer(0),
            Value::Integer(1),
            Value::Integer(-2),
            Value::Integer(300),
        ];
        sorted.sort_by(Value::cmp_canonical);

        assert_eq!(
            sorted,
            vec![
                Value::Integer(0),
                Value::Integer(1),
                Value::Integer(300),
                Value::Integer(-1),
                Value::Integer(-2),
            ]
        );
    }

    #[test]
    fn simple_values_sort_before_floats() {
        let mut sorted = vec![
            Value::Float(0.5),
            Value::Null,
            Value::Bool(true),
            Value::Bool(false),
        ];
        sorted.sort_by(Value::cmp_canonical);

        assert_eq!(
            sorted,
            vec![
                Value::Bool(false),
                Value::Bool(true),
                Value::Null,
                Value::Float(0.5),
            ]
        );
    }

    #[test]
    fn nan_values_are_equal() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(-f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
    }

    #[test]
    fn value_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(42).as_integer(), Some(42));
        assert_eq!(Value::Integer(42).as_float(), Some(42.0));
        assert_eq!(Value::Float(29.97).as_float(), Some(29.97));
        assert_eq!(Value::Float(1.0).as_integer(), None);
        assert_eq!(Value::Text("hello".to_string()).as_text(), Some("hello"));
        assert_eq!(Value::Bytes(vec![1, 2, 3]).as_bytes(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn map_get() {
        let map = Value::from_fields([
            ("resolution", Value::from("1080p")),
            ("fps", Value::Integer(30)),
        ]);

        assert_eq!(map.get("resolution"), Some(&Value::from("1080p")));
        assert_eq!(map.get("fps"), Some(&Value::Integer(30)));
        assert_eq!(map.get("missing"), None);
        assert_eq!(Value::Integer(1).get("fps"), None);
    }
}
