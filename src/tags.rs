//! The IANA tag registry slice this codec validates against, and the
//! content-shape checks the Reader runs after decoding a tagged item.

use crate::{constants::*, error::ErrorKind, value::Value};
use std::fmt::{Display, Formatter};

/// Shape of data item a registered tag admits as its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRequirement {
    /// any content is admissible
    Any,
    /// must be an unsigned integer
    Unsigned,
    /// unsigned or negative integer
    Integer,
    /// integer or float of any width
    Numeric,
    /// byte string, optionally of exact length
    Bytes { len: Option<usize> },
    /// text string
    Text,
    /// array, optionally of exact element count
    Array { len: Option<usize> },
    /// map
    Map,
    /// a nested tag of the given number
    Tagged(u64),
    /// the tag is explicitly invalid and admits nothing
    Invalid,
}

impl ItemRequirement {
    fn admits(&self, value: &Value) -> bool {
        match self {
            ItemRequirement::Any => true,
            ItemRequirement::Unsigned => value.is_unsigned(),
            ItemRequirement::Integer => value.is_integer(),
            ItemRequirement::Numeric => value.is_integer() || value.is_float(),
            ItemRequirement::Bytes { len } => match value {
                Value::Bytes(b) => len.map_or(true, |n| b.len() == n),
                _ => false,
            },
            ItemRequirement::Text => value.is_text(),
            ItemRequirement::Array { len } => match value {
                Value::Array(a) => len.map_or(true, |n| a.len() == n),
                _ => false,
            },
            ItemRequirement::Map => value.is_map(),
            ItemRequirement::Tagged(tag) => matches!(value, Value::Tagged(t, _) if t == tag),
            ItemRequirement::Invalid => false,
        }
    }
}

impl Display for ItemRequirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemRequirement::Any => write!(f, "any data item"),
            ItemRequirement::Unsigned => write!(f, "an unsigned integer"),
            ItemRequirement::Integer => write!(f, "an integer"),
            ItemRequirement::Numeric => write!(f, "a number"),
            ItemRequirement::Bytes { len: None } => write!(f, "a byte string"),
            ItemRequirement::Bytes { len: Some(n) } => {
                write!(f, "a byte string of length {}", n)
            }
            ItemRequirement::Text => write!(f, "a text string"),
            ItemRequirement::Array { len: None } => write!(f, "an array"),
            ItemRequirement::Array { len: Some(n) } => write!(f, "an array of {} elements", n),
            ItemRequirement::Map => write!(f, "a map"),
            ItemRequirement::Tagged(tag) => write!(f, "a nested tag {}", tag),
            ItemRequirement::Invalid => write!(f, "nothing (the tag is invalid)"),
        }
    }
}

/// One registry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDef {
    pub tag: u64,
    /// the semantics string the registry carries for this tag
    pub name: &'static str,
    pub content: ItemRequirement,
}

const fn def(tag: u64, name: &'static str, content: ItemRequirement) -> TagDef {
    TagDef { tag, name, content }
}

use ItemRequirement::*;

/// The registry snapshot, sorted by tag number for binary search.
static REGISTRY: &[TagDef] = &[
    def(0, "standard date/time string", Text),
    def(1, "epoch-based date/time", Numeric),
    def(2, "unsigned bignum", Bytes { len: None }),
    def(3, "negative bignum", Bytes { len: None }),
    def(4, "decimal fraction", Array { len: Some(2) }),
    def(5, "bigfloat", Array { len: Some(2) }),
    def(16, "COSE_Encrypt0", Array { len: None }),
    def(17, "COSE_Mac0", Array { len: None }),
    def(18, "COSE_Sign1", Array { len: None }),
    def(19, "COSE_Countersignature", Array { len: None }),
    def(21, "expected conversion to base64url encoding", Any),
    def(22, "expected conversion to base64 encoding", Any),
    def(23, "expected conversion to base16 encoding", Any),
    def(24, "encoded CBOR data item", Bytes { len: None }),
    def(25, "reference the nth previously seen string", Unsigned),
    def(26, "serialised Perl object", Array { len: None }),
    def(27, "serialised language-independent object", Array { len: None }),
    def(28, "mark value as (potentially) shared", Any),
    def(29, "reference nth marked value", Unsigned),
    def(30, "rational number", Array { len: Some(2) }),
    def(31, "absent value in a CBOR array", Any),
    def(32, "URI", Text),
    def(33, "base64url-encoded text", Text),
    def(34, "base64-encoded text", Text),
    def(35, "regular expression", Text),
    def(36, "MIME message", Text),
    def(37, "binary UUID", Bytes { len: Some(16) }),
    def(38, "language-tagged string", Array { len: Some(2) }),
    def(39, "identifier", Any),
    def(40, "multi-dimensional array, row-major order", Array { len: Some(2) }),
    def(41, "homogeneous array", Array { len: None }),
    def(42, "IPLD content identifier", Bytes { len: None }),
    def(43, "YANG bits datatype", Text),
    def(44, "YANG enumeration datatype", Text),
    def(45, "YANG identityref datatype", Any),
    def(46, "YANG instance-identifier datatype", Any),
    def(47, "YANG Schema Item iDentifier", Unsigned),
    def(52, "IPv4 address or prefix", Any),
    def(54, "IPv6 address or prefix", Any),
    def(61, "CBOR Web Token", Any),
    def(64, "uint8 typed array", Bytes { len: None }),
    def(65, "uint16 typed array, big endian", Bytes { len: None }),
    def(66, "uint32 typed array, big endian", Bytes { len: None }),
    def(67, "uint64 typed array, big endian", Bytes { len: None }),
    def(68, "uint8 typed array, clamped arithmetic", Bytes { len: None }),
    def(69, "uint16 typed array, little endian", Bytes { len: None }),
    def(70, "uint32 typed array, little endian", Bytes { len: None }),
    def(71, "uint64 typed array, little endian", Bytes { len: None }),
    def(72, "sint8 typed array", Bytes { len: None }),
    def(73, "sint16 typed array, big endian", Bytes { len: None }),
    def(74, "sint32 typed array, big endian", Bytes { len: None }),
    def(75, "sint64 typed array, big endian", Bytes { len: None }),
    def(76, "reserved", Invalid),
    def(77, "sint16 typed array, little endian", Bytes { len: None }),
    def(78, "sint32 typed array, little endian", Bytes { len: None }),
    def(79, "sint64 typed array, little endian", Bytes { len: None }),
    def(80, "IEEE 754 binary16 typed array, big endian", Bytes { len: None }),
    def(81, "IEEE 754 binary32 typed array, big endian", Bytes { len: None }),
    def(82, "IEEE 754 binary64 typed array, big endian", Bytes { len: None }),
    def(83, "IEEE 754 binary128 typed array, big endian", Bytes { len: None }),
    def(84, "IEEE 754 binary16 typed array, little endian", Bytes { len: None }),
    def(85, "IEEE 754 binary32 typed array, little endian", Bytes { len: None }),
    def(86, "IEEE 754 binary64 typed array, little endian", Bytes { len: None }),
    def(87, "IEEE 754 binary128 typed array, little endian", Bytes { len: None }),
    def(96, "COSE_Encrypt", Array { len: None }),
    def(97, "COSE_Mac", Array { len: None }),
    def(98, "COSE_Sign", Array { len: None }),
    def(100, "number of days since the epoch date 1970-01-01", Integer),
    def(101, "alternatives as given by the uint + 128", Any),
    def(103, "geographic coordinates", Array { len: None }),
    def(104, "geographic coordinate reference system WKT or EPSG number", Array { len: None }),
    def(110, "relative object identifier (BER encoding)", Bytes { len: None }),
    def(111, "object identifier (BER encoding)", Bytes { len: None }),
    def(
        112,
        "object identifier (BER encoding), relative to 1.3.6.1.4.1",
        Bytes { len: None },
    ),
    def(120, "Internet of Things data point", Any),
    def(121, "alternatives as given by the uint + 121", Any),
    def(200, "Gordian Envelope", Any),
    def(201, "Gordian Envelope leaf", Any),
    def(256, "mark value as having string references", Any),
    def(257, "binary MIME message", Bytes { len: None }),
    def(258, "mathematical finite set", Array { len: None }),
    def(259, "map datatype with key-value operations", Map),
    def(260, "network address (IPv4 or IPv6 or MAC address)", Bytes { len: None }),
    def(261, "network address prefix", Map),
    def(262, "embedded JSON object", Bytes { len: None }),
    def(263, "hexadecimal string", Bytes { len: None }),
    def(266, "internationalized resource identifier", Text),
    def(267, "internationalized resource identifier reference", Text),
    def(1001, "extended time", Map),
    def(1002, "duration", Map),
    def(1003, "period", Map),
    def(40000, "first-come first-served registration", Any),
    def(40001, "first-come first-served registration", Any),
    def(55799, "self-described CBOR", Any),
    def(65535, "always invalid", Invalid),
    def(15_309_736, "RAINS message", Map),
    def(4_294_967_295, "always invalid", Invalid),
    def(18_446_744_073_709_551_615, "always invalid", Invalid),
];

/// Look up a tag number in the registry.
pub fn lookup(tag: u64) -> Option<&'static TagDef> {
    REGISTRY
        .binary_search_by_key(&tag, |d| d.tag)
        .ok()
        .map(|idx| &REGISTRY[idx])
}

fn violation(def: &TagDef, detail: impl Display) -> ErrorKind {
    ErrorKind::InvalidFormat(format!("tag {} ({}) requires {}", def.tag, def.name, detail).into())
}

fn integer_or_bignum(value: &Value) -> bool {
    value.is_integer()
        || matches!(value, Value::Tagged(t, _) if *t == TAG_BIGNUM_POS || *t == TAG_BIGNUM_NEG)
}

/// Check a decoded tag content against the registry.
///
/// Unknown tags pass in lenient mode and fail with `TagNotSupported` in
/// strict mode. Registered tags always have their content shape checked.
pub(crate) fn validate(tag: u64, content: &Value, strict: bool) -> Result<(), ErrorKind> {
    let def = match lookup(tag) {
        Some(def) => def,
        None if strict => return Err(ErrorKind::TagNotSupported(tag)),
        None => return Ok(()),
    };
    if !def.content.admits(content) {
        return Err(violation(def, def.content));
    }
    match tag {
        TAG_ISO8601 => {
            // crude RFC 3339 shape check; full parsing is a strategy concern
            if !matches!(content, Value::Text(s) if s.contains('T') || s.contains('t')) {
                return Err(violation(def, "an RFC 3339 shaped text string"));
            }
        }
        TAG_FRACTION | TAG_BIGFLOAT => {
            let elements = content.as_array().unwrap_or(&[]);
            if !elements[0].is_integer() {
                return Err(violation(def, "an integer exponent as its first element"));
            }
            if tag == TAG_FRACTION && !integer_or_bignum(&elements[1]) {
                return Err(violation(def, "an integer or bignum mantissa as its second element"));
            }
        }
        TAG_RATIONAL => {
            let elements = content.as_array().unwrap_or(&[]);
            if !elements.iter().all(integer_or_bignum) {
                return Err(violation(def, "integer or bignum elements"));
            }
        }
        TAG_LANGUAGE_STRING => {
            let elements = content.as_array().unwrap_or(&[]);
            if !elements.iter().all(Value::is_text) {
                return Err(violation(def, "a language tag and a text string"));
            }
        }
        TAG_NETWORK_ADDRESS => {
            if !matches!(content, Value::Bytes(b) if b.len() == 4 || b.len() == 16) {
                return Err(violation(def, "a byte string of length 4 or 16"));
            }
        }
        _ => {}
    }
    Ok(())
}
