use super::Value;
use std::{
    fmt::{Display, Formatter},
    hash::{Hash, Hasher},
};

/// A [`Value`](enum.Value.html) wrapped for use as a map key.
///
/// Map lookup needs `Eq + Hash`, which the plain `Value` cannot provide
/// because of its IEEE-754 float semantics (`NaN != NaN`, `+0 == -0`). The
/// wrapper compares floats by bit pattern instead, so every NaN payload is a
/// distinct key and the two zeroes do not collide.
///
/// Hashing folds the variant discriminator with the variant payload; for
/// `Array` and `Map` keys only the length is folded to bound the hash cost
/// of pathological nested keys. Equality always compares in full.
#[derive(Debug, Clone)]
pub struct Key(Value);

impl Key {
    pub fn new(value: Value) -> Self {
        Key(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Key(value)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

fn strict_eq(a: &Value, b: &Value) -> bool {
    use Value::*;
    match (a, b) {
        (Unsigned(x), Unsigned(y)) => x == y,
        (Negative(x), Negative(y)) => x == y,
        (Bytes(x), Bytes(y)) => x == y,
        (Text(x), Text(y)) => x == y,
        (Array(x), Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| strict_eq(a, b))
        }
        (Map(x), Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && strict_eq(va, vb))
        }
        (Tagged(ta, x), Tagged(tb, y)) => ta == tb && strict_eq(x, y),
        (Simple(x), Simple(y)) => x == y,
        (Float16(x), Float16(y)) => x.to_bits() == y.to_bits(),
        (Float32(x), Float32(y)) => x.to_bits() == y.to_bits(),
        (Float64(x), Float64(y)) => x.to_bits() == y.to_bits(),
        _ => false,
    }
}

fn hash_value<H: Hasher>(v: &Value, state: &mut H) {
    use Value::*;
    match v {
        Unsigned(x) => {
            state.write_u8(0);
            state.write_u64(*x);
        }
        Negative(x) => {
            state.write_u8(1);
            state.write_u64(*x);
        }
        Bytes(b) => {
            state.write_u8(2);
            state.write(b);
        }
        Text(s) => {
            state.write_u8(3);
            state.write(s.as_bytes());
        }
        // length only, see type-level docs
        Array(a) => {
            state.write_u8(4);
            state.write_usize(a.len());
        }
        Map(m) => {
            state.write_u8(5);
            state.write_usize(m.len());
        }
        Tagged(tag, inner) => {
            state.write_u8(6);
            state.write_u64(*tag);
            hash_value(inner, state);
        }
        Simple(s) => {
            state.write_u8(7);
            state.write_u8(s.info());
        }
        Float16(x) => {
            state.write_u8(8);
            state.write_u16(x.to_bits());
        }
        Float32(x) => {
            state.write_u8(9);
            state.write_u32(x.to_bits());
        }
        Float64(x) => {
            state.write_u8(10);
            state.write_u64(x.to_bits());
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        strict_eq(&self.0, &other.0)
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Simple;
    use half::f16;
    use std::collections::HashSet;

    fn k(v: Value) -> Key {
        Key::new(v)
    }

    #[test]
    fn float_keys_are_bit_exact() {
        assert_ne!(k(Value::Float64(0.0)), k(Value::Float64(-0.0)));
        assert_eq!(k(Value::Float64(f64::NAN)), k(Value::Float64(f64::NAN)));
        assert_ne!(
            k(Value::Float16(f16::from_bits(0x7e00))),
            k(Value::Float16(f16::from_bits(0x7e01)))
        );
        // widths are distinct variants even for equal numbers
        assert_ne!(k(Value::Float32(1.0)), k(Value::Float64(1.0)));
    }

    #[test]
    fn aggregate_keys_compare_in_full() {
        let a = k(Value::Array(vec![Value::Unsigned(1), Value::Unsigned(2)]));
        let b = k(Value::Array(vec![Value::Unsigned(1), Value::Unsigned(3)]));
        // same length, so same hash bucket, but not equal
        assert_ne!(a, b);

        let mut set = HashSet::new();
        assert!(set.insert(a.clone()));
        assert!(set.insert(b));
        assert!(!set.insert(a));
    }

    #[test]
    fn set_distinguishes_variants() {
        let mut set = HashSet::new();
        assert!(set.insert(k(Value::Unsigned(0))));
        assert!(set.insert(k(Value::Negative(0))));
        assert!(set.insert(k(Value::Simple(Simple::False))));
        assert!(set.insert(k(Value::Text("0".to_owned()))));
        assert!(set.insert(k(Value::Bytes(b"0".to_vec()))));
        assert_eq!(set.len(), 5);
    }
}
