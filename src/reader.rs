use crate::{
    constants::*,
    error::{DecodeError, ErrorKind::*},
    options::DecodeOptions,
    tags,
    value::{Key, Simple, Value},
};
use half::f16;
use std::{collections::HashSet, convert::TryFrom};

/// Streaming decoder turning CBOR bytes into a [`Value`](enum.Value.html) tree.
///
/// A reader holds a cursor into the input; [`read_value`](#method.read_value)
/// decodes exactly one item and leaves the cursor behind it, so
/// [`position`](#method.position) tells how many bytes the item consumed.
/// All validation happens here: length forms (shortest-form in strict mode),
/// UTF-8, nesting depth, duplicate map keys, indefinite-length chunk typing,
/// and registry checks for tag content.
///
/// Errors are fatal to the decode at hand; there is no resynchronisation and
/// no partial output.
///
/// ```
/// use cbor_tree::{Reader, Value};
///
/// let mut reader = Reader::new(&[0x83, 0x01, 0x02, 0x03]);
/// let value = reader.read_value().unwrap();
/// assert_eq!(
///     value,
///     Value::Array(vec![Value::Unsigned(1), Value::Unsigned(2), Value::Unsigned(3)])
/// );
/// assert_eq!(reader.position(), 4);
/// ```
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    opts: DecodeOptions,
}

enum Item {
    Value(Value),
    Break,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_options(bytes, DecodeOptions::default())
    }

    pub fn with_options(bytes: &'a [u8], opts: DecodeOptions) -> Self {
        Self {
            bytes,
            pos: 0,
            depth: 0,
            opts,
        }
    }

    /// Decode one item starting at the current cursor position.
    pub fn read_value(&mut self) -> Result<Value, DecodeError> {
        let start = self.pos;
        match self.item()? {
            Item::Value(value) => Ok(value),
            Item::Break => Err(DecodeError::new(start, InvalidIndefiniteLength)),
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// True when the whole input has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn err(&self, kind: crate::error::ErrorKind) -> DecodeError {
        DecodeError::new(self.pos, kind)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        match self.pos.checked_add(n) {
            Some(end) if end <= self.bytes.len() => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            _ => Err(DecodeError::new(self.bytes.len(), UnexpectedEnd)),
        }
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn head(&mut self) -> Result<(u8, u8), DecodeError> {
        let b = self.byte()?;
        Ok((b >> 5, b & 31))
    }

    /// Decode the additional-info value: either directly, or from 1, 2, 4 or
    /// 8 follow bytes. Strict mode rejects any form a shorter one would fit.
    fn length(&mut self, info: u8) -> Result<u64, DecodeError> {
        let value = match info {
            n if n < 24 => return Ok(u64::from(n)),
            24 => u64::from(self.byte()?),
            25 => {
                let s = self.take(2)?;
                u64::from(u16::from_be_bytes([s[0], s[1]]))
            }
            26 => {
                let s = self.take(4)?;
                u64::from(u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
            }
            27 => {
                let s = self.take(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(s);
                u64::from_be_bytes(buf)
            }
            _ => {
                return Err(self.err(InvalidFormat(
                    "reserved additional info in length position".into(),
                )))
            }
        };
        if self.opts.strict_mode {
            let shortest = match info {
                24 => value >= 24,
                25 => value > 0xff,
                26 => value > 0xffff,
                _ => value > 0xffff_ffff,
            };
            if !shortest {
                return Err(self.err(InvalidFormat("non-canonical length encoding".into())));
            }
        }
        Ok(value)
    }

    fn size(&self, len: u64) -> Result<usize, DecodeError> {
        usize::try_from(len)
            .map_err(|_| self.err(MalformedData("length exceeds address space".into())))
    }

    fn item(&mut self) -> Result<Item, DecodeError> {
        if self.depth >= self.opts.max_depth {
            return Err(self.err(DepthLimitExceeded));
        }
        self.depth += 1;
        let result = self.item_inner();
        self.depth -= 1;
        result
    }

    /// One decoded item, or an error when a break marker shows up where a
    /// value is required.
    fn child(&mut self) -> Result<Value, DecodeError> {
        let start = self.pos;
        match self.item()? {
            Item::Value(value) => Ok(value),
            Item::Break => Err(DecodeError::new(start, InvalidIndefiniteLength)),
        }
    }

    fn item_inner(&mut self) -> Result<Item, DecodeError> {
        let start = self.pos;
        let (major, info) = self.head()?;
        let item = match major {
            MAJOR_POS => Item::Value(Value::Unsigned(self.length(info)?)),
            MAJOR_NEG => Item::Value(Value::Negative(self.length(info)?)),
            MAJOR_BYTES => Item::Value(self.byte_string(info)?),
            MAJOR_STR => Item::Value(self.text_string(info)?),
            MAJOR_ARRAY => Item::Value(self.array_items(info)?),
            MAJOR_DICT => Item::Value(self.map_items(info)?),
            MAJOR_TAG => {
                let tag = self.length(info)?;
                let content = self.child()?;
                tags::validate(tag, &content, self.opts.strict_mode)
                    .map_err(|kind| DecodeError::new(start, kind))?;
                Item::Value(Value::Tagged(tag, Box::new(content)))
            }
            _ => self.literal(info)?,
        };
        Ok(item)
    }

    fn byte_string(&mut self, info: u8) -> Result<Value, DecodeError> {
        if info == INDEFINITE_SIZE {
            Ok(Value::Bytes(self.byte_chunks()?))
        } else {
            let len = self.length(info)?;
            let n = self.size(len)?;
            Ok(Value::Bytes(self.take(n)?.to_vec()))
        }
    }

    fn text_string(&mut self, info: u8) -> Result<Value, DecodeError> {
        if info == INDEFINITE_SIZE {
            Ok(Value::Text(self.text_chunks()?))
        } else {
            let len = self.length(info)?;
            let n = self.size(len)?;
            let offset = self.pos;
            match std::str::from_utf8(self.take(n)?) {
                Ok(s) => Ok(Value::Text(s.to_owned())),
                Err(e) => Err(DecodeError::new(offset, IncorrectUtf8String(e))),
            }
        }
    }

    /// Header of the next chunk inside an indefinite-length string, or
    /// `None` when the break marker closes it.
    fn chunk_header(
        &mut self,
        outer_major: u8,
        count: &mut usize,
    ) -> Result<Option<usize>, DecodeError> {
        let start = self.pos;
        let (major, info) = self.head()?;
        if major == MAJOR_LIT && info == INDEFINITE_SIZE {
            return Ok(None);
        }
        if major != outer_major {
            return Err(DecodeError::new(start, WrongTypeInsideIndefiniteLength));
        }
        if info == INDEFINITE_SIZE {
            return Err(DecodeError::new(
                start,
                InvalidFormat("nested indefinite-length string".into()),
            ));
        }
        *count += 1;
        if *count > self.opts.max_indefinite_chunks {
            return Err(DecodeError::new(start, TooLongIndefiniteLength));
        }
        let len = self.length(info)?;
        let n = self.size(len)?;
        Ok(Some(n))
    }

    fn byte_chunks(&mut self) -> Result<Vec<u8>, DecodeError> {
        let mut buf = Vec::new();
        let mut count = 0;
        while let Some(n) = self.chunk_header(MAJOR_BYTES, &mut count)? {
            if buf.len().checked_add(n).is_none() {
                return Err(self.err(MalformedData("string length overflow".into())));
            }
            buf.extend_from_slice(self.take(n)?);
        }
        Ok(buf)
    }

    fn text_chunks(&mut self) -> Result<String, DecodeError> {
        let mut buf = String::new();
        let mut count = 0;
        while let Some(n) = self.chunk_header(MAJOR_STR, &mut count)? {
            if buf.len().checked_add(n).is_none() {
                return Err(self.err(MalformedData("string length overflow".into())));
            }
            let offset = self.pos;
            // every chunk must be valid UTF-8 on its own
            let chunk = std::str::from_utf8(self.take(n)?)
                .map_err(|e| DecodeError::new(offset, IncorrectUtf8String(e)))?;
            buf.push_str(chunk);
        }
        Ok(buf)
    }

    fn array_items(&mut self, info: u8) -> Result<Value, DecodeError> {
        let mut items = Vec::new();
        if info == INDEFINITE_SIZE {
            loop {
                match self.item()? {
                    Item::Break => break,
                    Item::Value(v) => items.push(v),
                }
            }
        } else {
            let len = self.length(info)?;
            // bogus huge lengths fail on the first missing child
            items.reserve(len.min(1024) as usize);
            for _ in 0..len {
                let v = self.child()?;
                items.push(v);
            }
        }
        Ok(Value::Array(items))
    }

    fn map_items(&mut self, info: u8) -> Result<Value, DecodeError> {
        let mut pairs: Vec<(Key, Value)> = Vec::new();
        let mut seen: HashSet<Key> = HashSet::new();
        if info == INDEFINITE_SIZE {
            loop {
                let key_offset = self.pos;
                let key = match self.item()? {
                    Item::Break => break,
                    Item::Value(v) => v,
                };
                let value = self.child()?;
                self.push_pair(&mut pairs, &mut seen, key, value, key_offset)?;
            }
        } else {
            let len = self.length(info)?;
            pairs.reserve(len.min(1024) as usize);
            for _ in 0..len {
                let key_offset = self.pos;
                let key = self.child()?;
                let value = self.child()?;
                self.push_pair(&mut pairs, &mut seen, key, value, key_offset)?;
            }
        }
        Ok(Value::Map(pairs))
    }

    fn push_pair(
        &self,
        pairs: &mut Vec<(Key, Value)>,
        seen: &mut HashSet<Key>,
        key: Value,
        value: Value,
        key_offset: usize,
    ) -> Result<(), DecodeError> {
        let key = Key::new(key);
        if !self.opts.allow_duplicate_map_keys && !seen.insert(key.clone()) {
            return Err(DecodeError::new(key_offset, DuplicateMapKey));
        }
        pairs.push((key, value));
        Ok(())
    }

    fn literal(&mut self, info: u8) -> Result<Item, DecodeError> {
        let head_offset = self.pos - 1;
        let item = match info {
            LIT_FALSE => Item::Value(Value::Simple(Simple::False)),
            LIT_TRUE => Item::Value(Value::Simple(Simple::True)),
            LIT_NULL => Item::Value(Value::Simple(Simple::Null)),
            LIT_UNDEFINED => Item::Value(Value::Simple(Simple::Undefined)),
            LIT_SIMPLE => {
                let offset = self.pos;
                let v = self.byte()?;
                match Simple::from_info(v) {
                    Some(s) if !self.opts.strict_mode => Item::Value(Value::Simple(s)),
                    Some(_) => {
                        return Err(DecodeError::new(
                            offset,
                            InvalidFormat("non-canonical simple value encoding".into()),
                        ))
                    }
                    None if (LIT_SIMPLE..=INDEFINITE_SIZE).contains(&v) => {
                        return Err(DecodeError::new(offset, ReservedSimpleValue(v)))
                    }
                    // 0..=19 are unassigned and 32..=255 have no
                    // representation in the value model
                    None => return Err(DecodeError::new(offset, UnassignedSimpleValue(v))),
                }
            }
            LIT_FLOAT16 => {
                let s = self.take(2)?;
                Item::Value(Value::Float16(f16::from_bits(u16::from_be_bytes([
                    s[0], s[1],
                ]))))
            }
            LIT_FLOAT32 => {
                let s = self.take(4)?;
                Item::Value(Value::Float32(f32::from_bits(u32::from_be_bytes([
                    s[0], s[1], s[2], s[3],
                ]))))
            }
            LIT_FLOAT64 => {
                let s = self.take(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(s);
                Item::Value(Value::Float64(f64::from_bits(u64::from_be_bytes(buf))))
            }
            INDEFINITE_SIZE => Item::Break,
            n if n < LIT_FALSE => {
                return Err(DecodeError::new(head_offset, UnassignedSimpleValue(n)))
            }
            _ => {
                return Err(DecodeError::new(
                    head_offset,
                    InvalidFormat("reserved additional info".into()),
                ))
            }
        };
        Ok(item)
    }
}
