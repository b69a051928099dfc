#![doc = include_str!("../README.md")]

mod builder;
mod canonical;
pub mod constants;
mod error;
mod options;
mod reader;
pub mod tags;
pub mod value;


pub use builder::{ArrayBuilder, MapBuilder, Writer};
pub use error::{DecodeError, ErrorKind};
pub use options::{
    DataDecodingStrategy, DataEncodingStrategy, DateDecodingStrategy, DateEncodingStrategy,
    DecodeOptions, EncodeOptions, KeyDecodingStrategy, KeyEncodingStrategy,
    NonConformingFloatDecodingStrategy, Timestamp,
};
pub use reader::Reader;
pub use tags::{ItemRequirement, TagDef};
pub use value::{Key, Simple, Value};

/// Decode a single CBOR item with default options.
///
/// The input must contain exactly one item; trailing bytes fail the decode.
/// Use a [`Reader`](struct.Reader.html) directly to parse an item out of a
/// larger buffer.
pub fn decode_value(bytes: &[u8]) -> Result<Value, DecodeError> {
    decode_value_with(bytes, DecodeOptions::default())
}

/// Decode a single CBOR item with the given options.
pub fn decode_value_with(bytes: &[u8], options: DecodeOptions) -> Result<Value, DecodeError> {
    let mut reader = Reader::with_options(bytes, options);
    let value = reader.read_value()?;
    if !reader.is_at_end() {
        return Err(DecodeError::new(
            reader.position(),
            ErrorKind::InvalidFormat("trailing bytes after item".into()),
        ));
    }
    Ok(value)
}

/// Encode a value tree with default (non-canonical) options.
pub fn encode_to_bytes(value: &Value) -> Vec<u8> {
    encode_with(value, &EncodeOptions::default())
}

/// Encode a value tree with the given options.
pub fn encode_with(value: &Value, options: &EncodeOptions) -> Vec<u8> {
    let mut writer = Writer::with_options(options);
    writer.write_value(value);
    writer.into_bytes()
}

/// Encode a value tree deterministically.
///
/// Equal trees produce byte-for-byte equal output: shortest integer and
/// length forms, floats narrowed to the smallest exact width with the
/// canonical NaN, and map pairs ordered by encoded key.
pub fn encode_canonical(value: &Value) -> Vec<u8> {
    encode_with(value, &EncodeOptions::canonical())
}
