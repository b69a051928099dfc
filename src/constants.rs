#![allow(dead_code)]

pub const MAJOR_POS: u8 = 0;
pub const MAJOR_NEG: u8 = 1;
pub const MAJOR_BYTES: u8 = 2;
pub const MAJOR_STR: u8 = 3;
pub const MAJOR_ARRAY: u8 = 4;
pub const MAJOR_DICT: u8 = 5;
pub const MAJOR_TAG: u8 = 6;
pub const MAJOR_LIT: u8 = 7;

pub const LIT_FALSE: u8 = 20;
pub const LIT_TRUE: u8 = 21;
pub const LIT_NULL: u8 = 22;
pub const LIT_UNDEFINED: u8 = 23;
pub const LIT_SIMPLE: u8 = 24;
pub const LIT_FLOAT16: u8 = 25;
pub const LIT_FLOAT32: u8 = 26;
pub const LIT_FLOAT64: u8 = 27;

pub const INDEFINITE_SIZE: u8 = 31;
pub const STOP_BYTE: u8 = 0xff;

pub const TAG_ISO8601: u64 = 0;
pub const TAG_EPOCH: u64 = 1;
pub const TAG_BIGNUM_POS: u64 = 2;
pub const TAG_BIGNUM_NEG: u64 = 3;
pub const TAG_FRACTION: u64 = 4;
pub const TAG_BIGFLOAT: u64 = 5;
pub const TAG_RATIONAL: u64 = 30;
pub const TAG_BASE64URL: u64 = 33;
pub const TAG_BASE64: u64 = 34;
pub const TAG_UUID: u64 = 37;
pub const TAG_LANGUAGE_STRING: u64 = 38;
pub const TAG_NETWORK_ADDRESS: u64 = 260;
pub const TAG_CBOR_MARKER: u64 = 55799;

/// Canonical half-precision bit patterns for the special floating-point values.
pub const F16_NAN_BITS: u16 = 0x7e00;
pub const F16_INFINITY_BITS: u16 = 0x7c00;
pub const F16_NEG_INFINITY_BITS: u16 = 0xfc00;
