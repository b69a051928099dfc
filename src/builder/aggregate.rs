use super::{low_level::write_head, Config, Scratch, Writer};
use crate::{
    canonical,
    constants::{MAJOR_ARRAY, MAJOR_DICT},
};

/// Builder for an array item, used by [`Writer::write_array`](struct.Writer.html#method.write_array).
///
/// Child encodings accumulate until [`finish`](#method.finish) emits the
/// definite-length header followed by the children. The header is written
/// only on `finish`, never from a destructor.
pub struct ArrayBuilder {
    items: Vec<Scratch>,
    config: Config,
}

impl ArrayBuilder {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            items: Vec::new(),
            config,
        }
    }

    /// Encode one child item with the closure and append it.
    pub fn push(&mut self, f: impl FnOnce(&mut Writer)) -> &mut Self {
        let mut writer = Writer::with_config(self.config);
        f(&mut writer);
        self.items.push(writer.into_scratch());
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Emit the array into `out` as one definite-length item.
    pub fn finish(self, out: &mut Writer) {
        out.append_raw(|bytes| {
            write_head(bytes, MAJOR_ARRAY, self.items.len() as u64);
            for item in &self.items {
                bytes.extend_from_slice(item);
            }
        });
    }
}

/// Builder for a map item, used by [`Writer::write_map`](struct.Writer.html#method.write_map).
///
/// Key and value encodings accumulate as pairs; when key sorting is
/// configured, [`finish`](#method.finish) orders the pairs by encoded-key
/// length and then by lexicographic byte comparison before emitting them.
pub struct MapBuilder {
    pairs: Vec<(Scratch, Scratch)>,
    config: Config,
}

impl MapBuilder {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            pairs: Vec::new(),
            config,
        }
    }

    /// Add one pair with an arbitrary CBOR key.
    pub fn entry(
        &mut self,
        key: impl FnOnce(&mut Writer),
        value: impl FnOnce(&mut Writer),
    ) -> &mut Self {
        let mut k = Writer::with_config(self.config);
        key(&mut k);
        let mut v = Writer::with_config(self.config);
        value(&mut v);
        self.pairs.push((k.into_scratch(), v.into_scratch()));
        self
    }

    /// Add one pair with a text-string key.
    pub fn with_key(&mut self, key: &str, value: impl FnOnce(&mut Writer)) -> &mut Self {
        self.entry(|k| k.write_str(key), value)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Emit the map into `out` as one definite-length item.
    pub fn finish(self, out: &mut Writer) {
        let mut pairs = self.pairs;
        if self.config.sort_keys {
            canonical::sort_pairs(&mut pairs);
        }
        out.append_raw(|bytes| {
            write_head(bytes, MAJOR_DICT, pairs.len() as u64);
            for (key, value) in &pairs {
                bytes.extend_from_slice(key);
                bytes.extend_from_slice(value);
            }
        });
    }
}
