use std::{
    borrow::Cow,
    fmt::{Debug, Display},
    str::Utf8Error,
};

/// Errors that may be encountered when decoding CBOR bytes
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// structural or semantic violation, including non-canonical encodings in strict mode
    InvalidFormat(Cow<'static, str>),
    /// the provided bytes are incomplete
    UnexpectedEnd,
    /// chunk inside an indefinite-length string had the wrong major type
    WrongTypeInsideIndefiniteLength,
    /// indefinite-length string exceeded the configured chunk count
    TooLongIndefiniteLength,
    /// a text string (or chunk thereof) contained invalid UTF-8 data
    IncorrectUtf8String(Utf8Error),
    /// two equal keys in one map while duplicates are disallowed
    DuplicateMapKey,
    /// strict mode and the tag is absent from the registry
    TagNotSupported(u64),
    /// nesting exceeded the configured maximum
    DepthLimitExceeded,
    /// break marker encountered outside an indefinite-length item
    InvalidIndefiniteLength,
    /// simple value that the registry leaves unassigned
    UnassignedSimpleValue(u8),
    /// simple value in the reserved range 24..=31
    ReservedSimpleValue(u8),
    /// arithmetic overflow or other integrity failure
    MalformedData(Cow<'static, str>),
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
            ErrorKind::UnexpectedEnd => write!(f, "ran out of bytes mid-item"),
            ErrorKind::WrongTypeInsideIndefiniteLength => {
                write!(f, "string chunk of wrong major type")
            }
            ErrorKind::TooLongIndefiniteLength => {
                write!(f, "too many chunks in indefinite-length string")
            }
            ErrorKind::IncorrectUtf8String(e) => write!(f, "UTF-8 error `{}`", e),
            ErrorKind::DuplicateMapKey => write!(f, "duplicate map key"),
            ErrorKind::TagNotSupported(tag) => write!(f, "tag {} not in registry", tag),
            ErrorKind::DepthLimitExceeded => write!(f, "nesting depth limit exceeded"),
            ErrorKind::InvalidIndefiniteLength => {
                write!(f, "break marker outside indefinite-length item")
            }
            ErrorKind::UnassignedSimpleValue(v) => write!(f, "unassigned simple value {}", v),
            ErrorKind::ReservedSimpleValue(v) => write!(f, "reserved simple value {}", v),
            ErrorKind::MalformedData(msg) => write!(f, "malformed data: {}", msg),
        }
    }
}

/// Error container for decoding problems
#[derive(Clone, PartialEq, Eq)]
pub struct DecodeError {
    offset: usize,
    kind: ErrorKind,
}

impl DecodeError {
    pub(crate) fn new(offset: usize, kind: ErrorKind) -> Self {
        Self { offset, kind }
    }

    /// Byte offset into the input at which the problem was detected.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Get a reference to the decode error's kind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl Debug for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for DecodeError {}
