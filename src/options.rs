//! Decoder and encoder configuration, including the leaf-level strategies a
//! generic bridge threads through when mapping user types onto value trees.

use crate::{constants::TAG_EPOCH, value::Value};
#[cfg(feature = "rfc3339")]
use crate::constants::TAG_ISO8601;

/// Representation of a decoded date/time, independent of the wire encoding
/// it came from (tag 0 text, tag 1 epoch, or a bare number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    unix_epoch: i64,
    nanos: u32,
    tz_sec_east: i32,
}

impl Timestamp {
    pub fn new(unix_epoch: i64, nanos: u32, tz_sec_east: i32) -> Self {
        Self {
            unix_epoch,
            nanos,
            tz_sec_east,
        }
    }

    /// timestamp value in seconds since the Unix epoch
    pub fn unix_epoch(&self) -> i64 {
        self.unix_epoch
    }

    /// fractional part in nanoseconds, to be added
    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// timezone to use when encoding as a string, in seconds to the east
    pub fn tz_sec_east(&self) -> i32 {
        self.tz_sec_east
    }

    fn from_epoch(value: &Value) -> Option<Self> {
        match value {
            Value::Unsigned(t) => Some(Self::new((*t).min(i64::MAX as u64) as i64, 0, 0)),
            Value::Negative(raw) => {
                Some(Self::new(-1 - (*raw).min(i64::MAX as u64) as i64, 0, 0))
            }
            v if v.is_float() => {
                let t = v.as_f64()?;
                if t.is_nan() {
                    return None;
                }
                let seconds = t.floor();
                Some(Self::new(
                    seconds.max(i64::MIN as f64).min(i64::MAX as f64) as i64,
                    ((t - seconds) * 1e9) as u32,
                    0,
                ))
            }
            _ => None,
        }
    }

    #[cfg(feature = "rfc3339")]
    fn from_rfc3339(value: &Value) -> Option<Self> {
        let text = match value {
            Value::Tagged(tag, inner) if *tag == TAG_ISO8601 => inner.as_str()?,
            v => v.as_str()?,
        };
        chrono::DateTime::parse_from_rfc3339(text)
            .map(|dt| Self::new(dt.timestamp(), dt.timestamp_subsec_nanos(), dt.offset().local_minus_utc()))
            .ok()
    }

    #[cfg(feature = "rfc3339")]
    fn to_rfc3339(self) -> Option<String> {
        use chrono::{FixedOffset, LocalResult, Offset, TimeZone, Utc};
        let offset = FixedOffset::east_opt(self.tz_sec_east).unwrap_or_else(|| Utc.fix());
        match offset.timestamp_opt(self.unix_epoch, self.nanos) {
            LocalResult::Single(dt) => Some(dt.to_rfc3339()),
            _ => None,
        }
    }

    fn to_epoch_value(self) -> Value {
        if self.nanos == 0 {
            Value::from(self.unix_epoch)
        } else {
            Value::Float64(self.unix_epoch as f64 + f64::from(self.nanos) * 1e-9)
        }
    }
}

/// How date/time leaves are read out of the value tree.
#[derive(Debug, Clone, Copy)]
pub enum DateDecodingStrategy {
    /// bare numeric seconds since the Unix epoch
    EpochTime,
    /// expects tag 1 around the numeric seconds
    Tagged,
    /// parses RFC 3339 text, with or without tag 0
    #[cfg(feature = "rfc3339")]
    Iso8601String,
    Custom(fn(&Value) -> Option<Timestamp>),
}

impl DateDecodingStrategy {
    pub fn decode(&self, value: &Value) -> Option<Timestamp> {
        match self {
            DateDecodingStrategy::EpochTime => Timestamp::from_epoch(value),
            DateDecodingStrategy::Tagged => match value {
                Value::Tagged(tag, inner) if *tag == TAG_EPOCH => Timestamp::from_epoch(inner),
                _ => None,
            },
            #[cfg(feature = "rfc3339")]
            DateDecodingStrategy::Iso8601String => Timestamp::from_rfc3339(value),
            DateDecodingStrategy::Custom(f) => f(value),
        }
    }
}

/// How date/time leaves are written into the value tree.
#[derive(Debug, Clone, Copy)]
pub enum DateEncodingStrategy {
    /// bare numeric seconds since the Unix epoch
    EpochTime,
    /// tag 1 around the numeric seconds
    Tagged,
    /// tag 0 around RFC 3339 text
    #[cfg(feature = "rfc3339")]
    Iso8601String,
    Custom(fn(Timestamp) -> Option<Value>),
}

impl DateEncodingStrategy {
    pub fn encode(&self, timestamp: Timestamp) -> Option<Value> {
        match self {
            DateEncodingStrategy::EpochTime => Some(timestamp.to_epoch_value()),
            DateEncodingStrategy::Tagged => Some(Value::Tagged(
                TAG_EPOCH,
                Box::new(timestamp.to_epoch_value()),
            )),
            #[cfg(feature = "rfc3339")]
            DateEncodingStrategy::Iso8601String => timestamp
                .to_rfc3339()
                .map(|s| Value::Tagged(TAG_ISO8601, Box::new(Value::Text(s)))),
            DateEncodingStrategy::Custom(f) => f(timestamp),
        }
    }
}

/// How binary leaves are read out of the value tree.
#[derive(Debug, Clone, Copy)]
pub enum DataDecodingStrategy {
    ByteString,
    /// base64 text, as produced by encoders without a binary type
    Base64String,
    Custom(fn(&Value) -> Option<Vec<u8>>),
}

impl DataDecodingStrategy {
    pub fn decode(&self, value: &Value) -> Option<Vec<u8>> {
        match self {
            DataDecodingStrategy::ByteString => value.as_bytes().map(<[u8]>::to_vec),
            DataDecodingStrategy::Base64String => {
                value.as_str().and_then(|s| base64::decode(s).ok())
            }
            DataDecodingStrategy::Custom(f) => f(value),
        }
    }
}

/// How binary leaves are written into the value tree.
#[derive(Debug, Clone, Copy)]
pub enum DataEncodingStrategy {
    ByteString,
    Base64String,
    Custom(fn(&[u8]) -> Value),
}

impl DataEncodingStrategy {
    pub fn encode(&self, data: &[u8]) -> Value {
        match self {
            DataEncodingStrategy::ByteString => Value::Bytes(data.to_vec()),
            DataEncodingStrategy::Base64String => Value::Text(base64::encode(data)),
            DataEncodingStrategy::Custom(f) => f(data),
        }
    }
}

/// What to do when a float leaf arrives as something other than a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonConformingFloatDecodingStrategy {
    /// accept `"NaN"`, `"Infinity"`, `"-Infinity"` and decimal text
    ConvertFromString,
    Throw,
}

impl NonConformingFloatDecodingStrategy {
    pub fn decode(&self, value: &Value) -> Option<f64> {
        if let Some(x) = value.as_f64() {
            return Some(x);
        }
        if let Some(x) = value.as_i128() {
            return Some(x as f64);
        }
        match self {
            NonConformingFloatDecodingStrategy::ConvertFromString => {
                value.as_str().and_then(|s| match s {
                    "NaN" | "nan" => Some(f64::NAN),
                    "Infinity" | "+Infinity" | "inf" => Some(f64::INFINITY),
                    "-Infinity" | "-inf" => Some(f64::NEG_INFINITY),
                    _ => s.parse().ok(),
                })
            }
            NonConformingFloatDecodingStrategy::Throw => None,
        }
    }
}

fn snake_to_camel(key: &str) -> String {
    // leading and trailing underscores stay verbatim
    let start = key.len() - key.trim_start_matches('_').len();
    let end = key.trim_end_matches('_').len();
    if start >= end {
        return key.to_owned();
    }
    let mut out = String::with_capacity(key.len());
    out.push_str(&key[..start]);
    let mut upper_next = false;
    for c in key[start..end].chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out.push_str(&key[end..]);
    out
}

fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// How serialized map keys are turned into field names.
#[derive(Debug, Clone, Copy)]
pub enum KeyDecodingStrategy {
    UseDefaultKeys,
    ConvertFromSnakeCase,
    Custom(fn(&str) -> String),
}

impl KeyDecodingStrategy {
    pub fn apply(&self, key: &str) -> String {
        match self {
            KeyDecodingStrategy::UseDefaultKeys => key.to_owned(),
            KeyDecodingStrategy::ConvertFromSnakeCase => snake_to_camel(key),
            KeyDecodingStrategy::Custom(f) => f(key),
        }
    }
}

/// How field names are turned into serialized map keys.
#[derive(Debug, Clone, Copy)]
pub enum KeyEncodingStrategy {
    UseDefaultKeys,
    ConvertToSnakeCase,
    Custom(fn(&str) -> String),
}

impl KeyEncodingStrategy {
    pub fn apply(&self, key: &str) -> String {
        match self {
            KeyEncodingStrategy::UseDefaultKeys => key.to_owned(),
            KeyEncodingStrategy::ConvertToSnakeCase => camel_to_snake(key),
            KeyEncodingStrategy::Custom(f) => f(key),
        }
    }
}

/// Configuration for [`Reader`](crate::Reader) and
/// [`decode_value_with`](crate::decode_value_with).
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// keep both pairs when a map repeats a key instead of failing
    pub allow_duplicate_map_keys: bool,
    /// reject non-shortest-form encodings and unknown tags
    pub strict_mode: bool,
    /// maximum nesting depth, counted across aggregates and tags
    pub max_depth: usize,
    /// chunk-count cap for indefinite-length strings
    pub max_indefinite_chunks: usize,
    pub date_decoding: DateDecodingStrategy,
    pub data_decoding: DataDecodingStrategy,
    pub nonconforming_floats: NonConformingFloatDecodingStrategy,
    pub key_decoding: KeyDecodingStrategy,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            allow_duplicate_map_keys: false,
            strict_mode: false,
            max_depth: 512,
            max_indefinite_chunks: 1_000_000,
            date_decoding: DateDecodingStrategy::EpochTime,
            data_decoding: DataDecodingStrategy::ByteString,
            nonconforming_floats: NonConformingFloatDecodingStrategy::Throw,
            key_decoding: KeyDecodingStrategy::UseDefaultKeys,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_duplicate_map_keys(mut self, allow: bool) -> Self {
        self.allow_duplicate_map_keys = allow;
        self
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_indefinite_chunks(mut self, max: usize) -> Self {
        self.max_indefinite_chunks = max;
        self
    }

    pub fn with_date_decoding(mut self, strategy: DateDecodingStrategy) -> Self {
        self.date_decoding = strategy;
        self
    }

    pub fn with_data_decoding(mut self, strategy: DataDecodingStrategy) -> Self {
        self.data_decoding = strategy;
        self
    }

    pub fn with_nonconforming_floats(
        mut self,
        strategy: NonConformingFloatDecodingStrategy,
    ) -> Self {
        self.nonconforming_floats = strategy;
        self
    }

    pub fn with_key_decoding(mut self, strategy: KeyDecodingStrategy) -> Self {
        self.key_decoding = strategy;
        self
    }
}

/// Configuration for [`Writer`](crate::Writer) and
/// [`encode_with`](crate::encode_with).
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// order map pairs by encoded key even without full canonical mode
    pub sort_keys: bool,
    /// deterministic output: shortest forms, float narrowing, sorted keys
    pub use_canonical_encoding: bool,
    pub date_encoding: DateEncodingStrategy,
    pub data_encoding: DataEncodingStrategy,
    pub key_encoding: KeyEncodingStrategy,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            sort_keys: false,
            use_canonical_encoding: false,
            date_encoding: DateEncodingStrategy::EpochTime,
            data_encoding: DataEncodingStrategy::ByteString,
            key_encoding: KeyEncodingStrategy::UseDefaultKeys,
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic output in one switch: shortest forms, narrowed floats,
    /// canonical NaN, sorted map keys.
    pub fn canonical() -> Self {
        Self::default().with_canonical_encoding(true)
    }

    pub fn with_sort_keys(mut self, sort: bool) -> Self {
        self.sort_keys = sort;
        self
    }

    pub fn with_canonical_encoding(mut self, canonical: bool) -> Self {
        self.use_canonical_encoding = canonical;
        self
    }

    pub fn with_date_encoding(mut self, strategy: DateEncodingStrategy) -> Self {
        self.date_encoding = strategy;
        self
    }

    pub fn with_data_encoding(mut self, strategy: DataEncodingStrategy) -> Self {
        self.data_encoding = strategy;
        self
    }

    pub fn with_key_encoding(mut self, strategy: KeyEncodingStrategy) -> Self {
        self.key_encoding = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_decoding() {
        let s = DateDecodingStrategy::EpochTime;
        assert_eq!(
            s.decode(&Value::Unsigned(1_363_896_240)),
            Some(Timestamp::new(1_363_896_240, 0, 0))
        );
        assert_eq!(
            s.decode(&Value::Float64(1_363_896_240.5)),
            Some(Timestamp::new(1_363_896_240, 500_000_000, 0))
        );
        assert_eq!(
            s.decode(&Value::Negative(99)),
            Some(Timestamp::new(-100, 0, 0))
        );
        assert_eq!(s.decode(&Value::Text("soon".into())), None);

        let tagged = DateDecodingStrategy::Tagged;
        assert_eq!(
            tagged.decode(&Value::Tagged(1, Box::new(Value::Unsigned(100)))),
            Some(Timestamp::new(100, 0, 0))
        );
        assert_eq!(tagged.decode(&Value::Unsigned(100)), None);
    }

    #[test]
    fn epoch_encoding_prefers_integers() {
        let ts = Timestamp::new(100, 0, 0);
        assert_eq!(
            DateEncodingStrategy::EpochTime.encode(ts),
            Some(Value::Unsigned(100))
        );
        assert_eq!(
            DateEncodingStrategy::Tagged.encode(Timestamp::new(-2, 0, 0)),
            Some(Value::Tagged(1, Box::new(Value::Negative(1))))
        );
        assert_eq!(
            DateEncodingStrategy::EpochTime.encode(Timestamp::new(1, 500_000_000, 0)),
            Some(Value::Float64(1.5))
        );
    }

    #[cfg(feature = "rfc3339")]
    #[test]
    fn rfc3339_round_trip() {
        let s = DateDecodingStrategy::Iso8601String;
        let ts = s
            .decode(&Value::Text("2013-03-21T20:04:00+01:00".into()))
            .unwrap();
        assert_eq!(ts.unix_epoch(), 1_363_892_640);
        assert_eq!(ts.tz_sec_east(), 3600);

        let back = DateEncodingStrategy::Iso8601String.encode(ts).unwrap();
        assert_eq!(
            back,
            Value::Tagged(
                0,
                Box::new(Value::Text("2013-03-21T20:04:00+01:00".into()))
            )
        );
    }

    #[test]
    fn data_strategies() {
        let bytes = DataDecodingStrategy::ByteString;
        assert_eq!(bytes.decode(&Value::Bytes(vec![1, 2])), Some(vec![1, 2]));
        assert_eq!(bytes.decode(&Value::Text("AQI=".into())), None);

        let b64 = DataDecodingStrategy::Base64String;
        assert_eq!(b64.decode(&Value::Text("AQI=".into())), Some(vec![1, 2]));
        assert_eq!(b64.decode(&Value::Text("!!".into())), None);

        assert_eq!(
            DataEncodingStrategy::Base64String.encode(&[1, 2]),
            Value::Text("AQI=".into())
        );
    }

    #[test]
    fn nonconforming_floats() {
        let convert = NonConformingFloatDecodingStrategy::ConvertFromString;
        assert_eq!(convert.decode(&Value::Float32(1.5)), Some(1.5));
        assert_eq!(convert.decode(&Value::Unsigned(3)), Some(3.0));
        assert_eq!(convert.decode(&Value::Text("-Infinity".into())), Some(f64::NEG_INFINITY));
        assert!(convert.decode(&Value::Text("NaN".into())).unwrap().is_nan());
        assert_eq!(convert.decode(&Value::Text("2.5".into())), Some(2.5));
        assert_eq!(convert.decode(&Value::Text("two".into())), None);

        let throw = NonConformingFloatDecodingStrategy::Throw;
        assert_eq!(throw.decode(&Value::Text("2.5".into())), None);
        assert_eq!(throw.decode(&Value::Float64(2.5)), Some(2.5));
    }

    #[test]
    fn key_conversion() {
        let dec = KeyDecodingStrategy::ConvertFromSnakeCase;
        assert_eq!(dec.apply("chunk_count"), "chunkCount");
        assert_eq!(dec.apply("already"), "already");
        assert_eq!(dec.apply("_leading_underscore_"), "_leadingUnderscore_");

        let enc = KeyEncodingStrategy::ConvertToSnakeCase;
        assert_eq!(enc.apply("chunkCount"), "chunk_count");
        assert_eq!(enc.apply("already"), "already");
    }
}
