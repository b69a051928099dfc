use crate::{
    canonical,
    constants::*,
    options::EncodeOptions,
    value::{Simple, Value},
};
use half::f16;
use smallvec::SmallVec;

mod aggregate;
mod low_level;

pub use aggregate::{ArrayBuilder, MapBuilder};

use low_level::*;

/// Inline buffer for encoded items.
///
/// 16 bytes is the smallest that makes sense on 64-bit platforms (size of a
/// fat pointer) and covers every scalar encoding and most keys without
/// touching the heap.
pub(crate) type Scratch = SmallVec<[u8; 16]>;

/// Encoding configuration shared between a writer and its nested builders.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Config {
    pub canonical: bool,
    pub sort_keys: bool,
}

impl Config {
    pub(crate) fn from_options(options: &EncodeOptions) -> Self {
        Self {
            canonical: options.use_canonical_encoding,
            sort_keys: options.sort_keys || options.use_canonical_encoding,
        }
    }
}

/// Byte-level emitter for single CBOR items.
///
/// Every length and tag argument is written in its shortest form. The
/// canonical mode additionally narrows floats, replaces NaN payloads with
/// the canonical half-precision quiet NaN, and sorts map keys; outside
/// canonical mode floats keep their requested width and maps keep insertion
/// order.
///
/// ```
/// use cbor_tree::Writer;
///
/// let mut w = Writer::new();
/// w.write_array(|a| {
///     a.push(|w| w.write_u64(1));
///     a.push(|w| w.write_str("two"));
/// });
/// assert_eq!(w.into_bytes(), vec![0x82, 0x01, 0x63, b't', b'w', b'o']);
/// ```
pub struct Writer {
    bytes: Scratch,
    config: Config,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// A writer with default (non-canonical) configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// A writer configured from encoder options.
    pub fn with_options(options: &EncodeOptions) -> Self {
        Self::with_config(Config::from_options(options))
    }

    pub(crate) fn with_config(config: Config) -> Self {
        Self {
            bytes: Scratch::new(),
            config,
        }
    }

    pub(crate) fn append_raw(&mut self, f: impl FnOnce(&mut Scratch)) {
        f(&mut self.bytes)
    }

    pub(crate) fn into_scratch(self) -> Scratch {
        self.bytes
    }

    /// The bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Finish writing and take the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes.into_vec()
    }

    pub fn write_null(&mut self) {
        write_simple_info(&mut self.bytes, LIT_NULL);
    }

    pub fn write_undefined(&mut self) {
        write_simple_info(&mut self.bytes, LIT_UNDEFINED);
    }

    pub fn write_bool(&mut self, value: bool) {
        write_simple_info(&mut self.bytes, if value { LIT_TRUE } else { LIT_FALSE });
    }

    pub fn write_simple(&mut self, value: Simple) {
        write_simple_info(&mut self.bytes, value.info());
    }

    /// Write an unsigned value of up to 64 bits.
    pub fn write_u64(&mut self, value: u64) {
        write_head(&mut self.bytes, MAJOR_POS, value);
    }

    /// Write a negative value of up to 64 bits — the represented number is
    /// `-1 - raw`.
    pub fn write_negative(&mut self, raw: u64) {
        write_head(&mut self.bytes, MAJOR_NEG, raw);
    }

    /// Write a signed integer, picking major 0 or 1 by sign.
    pub fn write_i64(&mut self, value: i64) {
        if value < 0 {
            write_head(&mut self.bytes, MAJOR_NEG, !(value as u64));
        } else {
            write_head(&mut self.bytes, MAJOR_POS, value as u64);
        }
    }

    /// Write the given slice as a definite-length byte string.
    pub fn write_bytes(&mut self, value: &[u8]) {
        write_head(&mut self.bytes, MAJOR_BYTES, value.len() as u64);
        self.bytes.extend_from_slice(value);
    }

    /// Write the given string as a definite-length text string.
    pub fn write_str(&mut self, value: &str) {
        write_head(&mut self.bytes, MAJOR_STR, value.len() as u64);
        self.bytes.extend_from_slice(value.as_bytes());
    }

    /// Write a tag head; the next item written becomes its content.
    pub fn write_tag(&mut self, tag: u64) {
        write_head(&mut self.bytes, MAJOR_TAG, tag);
    }

    pub fn write_f16(&mut self, value: f16) {
        if self.config.canonical {
            canonical::write_narrowed(&mut self.bytes, f64::from(value));
        } else {
            write_f16_bits(&mut self.bytes, value.to_bits());
        }
    }

    pub fn write_f32(&mut self, value: f32) {
        if self.config.canonical {
            canonical::write_narrowed(&mut self.bytes, f64::from(value));
        } else {
            write_f32_bits(&mut self.bytes, value.to_bits());
        }
    }

    pub fn write_f64(&mut self, value: f64) {
        if self.config.canonical {
            canonical::write_narrowed(&mut self.bytes, value);
        } else {
            write_f64_bits(&mut self.bytes, value.to_bits());
        }
    }

    /// Write a nested array using the given closure that receives the
    /// array builder.
    pub fn write_array(&mut self, f: impl FnOnce(&mut ArrayBuilder)) {
        let mut builder = ArrayBuilder::new(self.config);
        f(&mut builder);
        builder.finish(self);
    }

    /// Write a nested map using the given closure that receives the
    /// map builder.
    pub fn write_map(&mut self, f: impl FnOnce(&mut MapBuilder)) {
        let mut builder = MapBuilder::new(self.config);
        f(&mut builder);
        builder.finish(self);
    }

    /// Write a whole value tree.
    pub fn write_value(&mut self, value: &Value) {
        match value {
            Value::Unsigned(x) => self.write_u64(*x),
            Value::Negative(raw) => self.write_negative(*raw),
            Value::Bytes(b) => self.write_bytes(b),
            Value::Text(s) => self.write_str(s),
            Value::Array(items) => self.write_array(|builder| {
                for item in items {
                    builder.push(|w| w.write_value(item));
                }
            }),
            Value::Map(pairs) => self.write_map(|builder| {
                for (k, v) in pairs {
                    builder.entry(|w| w.write_value(k.value()), |w| w.write_value(v));
                }
            }),
            Value::Tagged(tag, inner) => {
                self.write_tag(*tag);
                self.write_value(inner);
            }
            Value::Simple(s) => self.write_simple(*s),
            Value::Float16(x) => self.write_f16(*x),
            Value::Float32(x) => self.write_f32(*x),
            Value::Float64(x) => self.write_f64(*x),
        }
    }
}
