use half::f16;
use std::{
    convert::TryFrom,
    fmt::{Display, Formatter},
};

mod key;

pub use key::Key;

/// The four assigned simple values of major type 7.
///
/// All other simple values are either reserved (24..=31) or unassigned in the
/// registry; the Reader rejects them instead of materialising them here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Simple {
    False,
    True,
    Null,
    Undefined,
}

impl Simple {
    pub(crate) fn from_info(info: u8) -> Option<Self> {
        match info {
            crate::constants::LIT_FALSE => Some(Simple::False),
            crate::constants::LIT_TRUE => Some(Simple::True),
            crate::constants::LIT_NULL => Some(Simple::Null),
            crate::constants::LIT_UNDEFINED => Some(Simple::Undefined),
            _ => None,
        }
    }

    /// The additional-info value this simple value is encoded with.
    pub fn info(self) -> u8 {
        match self {
            Simple::False => crate::constants::LIT_FALSE,
            Simple::True => crate::constants::LIT_TRUE,
            Simple::Null => crate::constants::LIT_NULL,
            Simple::Undefined => crate::constants::LIT_UNDEFINED,
        }
    }
}

impl Display for Simple {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Simple::False => write!(f, "false"),
            Simple::True => write!(f, "true"),
            Simple::Null => write!(f, "null"),
            Simple::Undefined => write!(f, "undefined"),
        }
    }
}

/// An owned CBOR data item.
///
/// Every distinction RFC 8949 makes on the wire is preserved: the
/// unsigned/negative split of majors 0 and 1, the three floating-point
/// widths, tags, and the four assigned simple values.
///
/// Beware of the `Negative` variant: it carries the raw additional value,
/// the represented number is `-1 - raw`. This keeps the full major-1 range
/// `-2^64 ..= -1` representable; [`as_i64`](#method.as_i64) is the lossy
/// view for the common case.
///
/// The `Display` implementation adheres to the
/// [diagnostic notation](https://datatracker.ietf.org/doc/html/rfc8949#section-8).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unsigned(u64),
    Negative(u64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Map(Vec<(Key, Value)>),
    Tagged(u64, Box<Value>),
    Simple(Simple),
    Float16(f16),
    Float32(f32),
    Float64(f64),
}

impl Value {
    pub fn is_unsigned(&self) -> bool {
        matches!(self, Value::Unsigned(_))
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, Value::Negative(_))
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_tagged(&self) -> bool {
        matches!(self, Value::Tagged(..))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Simple(Simple::Null))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Simple(Simple::Undefined))
    }

    /// True for any of the three float widths.
    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float16(_) | Value::Float32(_) | Value::Float64(_))
    }

    /// True for unsigned and negative integers alike.
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Unsigned(_) | Value::Negative(_))
    }

    pub fn as_u64(&self) -> Option<u64> {
        if let Value::Unsigned(x) = self {
            Some(*x)
        } else {
            None
        }
    }

    /// The represented integer, if it fits a 64-bit signed number.
    ///
    /// `Negative` values below `-2^63` return `None`; use
    /// [`as_i128`](#method.as_i128) for the full range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Unsigned(x) => i64::try_from(*x).ok(),
            Value::Negative(raw) => i64::try_from(*raw).ok().map(|r| -1 - r),
            _ => None,
        }
    }

    /// The represented integer; covers the full range of majors 0 and 1.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Unsigned(x) => Some(i128::from(*x)),
            Value::Negative(raw) => Some(-1 - i128::from(*raw)),
            _ => None,
        }
    }

    /// Any float width, widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float16(x) => Some(f64::from(*x)),
            Value::Float32(x) => Some(f64::from(*x)),
            Value::Float64(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Simple(Simple::False) => Some(false),
            Value::Simple(Simple::True) => Some(true),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Text(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let Value::Bytes(b) = self {
            Some(b)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        if let Value::Array(a) = self {
            Some(a)
        } else {
            None
        }
    }

    pub fn as_map(&self) -> Option<&[(Key, Value)]> {
        if let Value::Map(m) = self {
            Some(m)
        } else {
            None
        }
    }

    pub fn as_tagged(&self) -> Option<(u64, &Value)> {
        if let Value::Tagged(tag, inner) = self {
            Some((*tag, inner))
        } else {
            None
        }
    }

    /// Look up a map entry by text key.
    ///
    /// When a map was decoded with duplicate keys allowed, the pair written
    /// last wins, so the scan runs from the back.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        if let Value::Map(pairs) = self {
            pairs
                .iter()
                .rev()
                .find(|(k, _)| matches!(k.value(), Value::Text(s) if s == key))
                .map(|(_, v)| v)
        } else {
            None
        }
    }
}

impl From<u64> for Value {
    fn from(x: u64) -> Self {
        Value::Unsigned(x)
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Self {
        if x < 0 {
            Value::Negative(!(x as u64))
        } else {
            Value::Unsigned(x as u64)
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Simple(if b { Simple::True } else { Simple::False })
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<f16> for Value {
    fn from(x: f16) -> Self {
        Value::Float16(x)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float32(x)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float64(x)
    }
}

fn write_float(f: &mut Formatter<'_>, x: f64) -> std::fmt::Result {
    if x == f64::INFINITY {
        write!(f, "Infinity")
    } else if x == f64::NEG_INFINITY {
        write!(f, "-Infinity")
    } else if x.is_nan() {
        write!(f, "NaN")
    } else {
        let s = if x != 0.0 && (x.abs() < 1e-6 || x.abs() > 1e16) {
            format!("{:e}", x)
        } else {
            format!("{}", x)
        };
        let e = s.find('e').unwrap_or_else(|| s.len());
        let (mantissa, exponent) = s.split_at(e);
        write!(f, "{}", mantissa)?;
        if !mantissa.contains('.') {
            write!(f, ".0")?;
        }
        write!(f, "{}", exponent)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Unsigned(x) => write!(f, "{}", x),
            Value::Negative(raw) => write!(f, "{}", -1 - i128::from(*raw)),
            Value::Bytes(b) => {
                write!(f, "h'")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, "'")
            }
            Value::Text(s) => write!(f, "\"{}\"", s.escape_debug()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (idx, (k, v)) in pairs.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Tagged(tag, inner) => write!(f, "{}({})", tag, inner),
            Value::Simple(s) => write!(f, "{}", s),
            Value::Float16(x) => write_float(f, f64::from(*x)),
            Value::Float32(x) => write_float(f, f64::from(*x)),
            Value::Float64(x) => write_float(f, *x),
        }
    }
}
