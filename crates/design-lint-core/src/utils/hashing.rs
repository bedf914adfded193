//! Deterministic structural hashing of JSON values.
//!
//! Hashes are invariant to object key order and ignore the values of
//! excluded keys at every depth. The encoding is type-tagged and
//! length-prefixed, so `"1"` and `1`, or `["ab"]` and `["a", "b"]`, never
//! collide structurally. Numbers hash by value: `1`, `1.0` and `-0.0`/`0`
//! are the same number.

use serde_json::{Map, Number, Value};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// Field holding a node's generated unique id.
pub const OBJECT_ID_KEY: &str = "do_objectID";

/// Style fields compared by [`style_hash`].
pub const STYLE_KEYS: &[&str] = &[
    "borders",
    "borderOptions",
    "blur",
    "fills",
    "shadows",
    "innerShadows",
];

/// Extra style fields compared by [`text_style_hash`].
pub const TEXT_STYLE_KEYS: &[&str] = &["textStyle"];

/// A 128-bit structural digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(u128);

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_NUMBER: u8 = 2;
const TAG_STRING: u8 = 3;
const TAG_ARRAY: u8 = 4;
const TAG_OBJECT: u8 = 5;

/// Hashes a value, ignoring `excluded` keys at every depth.
#[must_use]
pub fn structural_hash(value: &Value, excluded: &[&str]) -> Digest {
    let mut hasher = Xxh3::new();
    write_value(&mut hasher, value, excluded);
    Digest(hasher.digest128())
}

/// True when both values hash identically under the same exclusions.
#[must_use]
pub fn structural_equal(a: &Value, b: &Value, excluded: &[&str]) -> bool {
    structural_hash(a, excluded) == structural_hash(b, excluded)
}

/// Like [`structural_hash`], additionally excluding [`OBJECT_ID_KEY`].
#[must_use]
pub fn stable_hash(value: &Value, excluded: &[&str]) -> Digest {
    let mut keys = Vec::with_capacity(excluded.len() + 1);
    keys.push(OBJECT_ID_KEY);
    keys.extend_from_slice(excluded);
    structural_hash(value, &keys)
}

/// Hashes the canonical visual fields of a style.
///
/// A missing style hashes the same as a style with none of the fields.
#[must_use]
pub fn style_hash(style: Option<&Value>) -> Digest {
    stable_hash(&fingerprint(style, STYLE_KEYS, &[]), &[])
}

/// Hashes the canonical visual fields of a text style.
#[must_use]
pub fn text_style_hash(style: Option<&Value>) -> Digest {
    stable_hash(&fingerprint(style, STYLE_KEYS, TEXT_STYLE_KEYS), &[])
}

fn fingerprint(style: Option<&Value>, keys: &[&str], extra: &[&str]) -> Value {
    let mut selected = Map::new();
    if let Some(Value::Object(fields)) = style {
        for key in keys.iter().chain(extra) {
            if let Some(value) = fields.get(*key) {
                selected.insert((*key).to_string(), value.clone());
            }
        }
    }
    Value::Object(selected)
}

fn write_len(hasher: &mut Xxh3, len: usize) {
    hasher.update(&(len as u64).to_le_bytes());
}

fn write_str(hasher: &mut Xxh3, s: &str) {
    write_len(hasher, s.len());
    hasher.update(s.as_bytes());
}

/// Largest magnitude below which every integral `f64` fits an `i64`.
const I64_EXACT_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Integral floats take their integer form, which also folds `-0.0` into `0`.
#[allow(clippy::cast_possible_truncation)]
fn canonical_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < I64_EXACT_BOUND => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn write_value(hasher: &mut Xxh3, value: &Value, excluded: &[&str]) {
    match value {
        Value::Null => hasher.update(&[TAG_NULL]),
        Value::Bool(b) => hasher.update(&[TAG_BOOL, u8::from(*b)]),
        Value::Number(n) => {
            hasher.update(&[TAG_NUMBER]);
            write_str(hasher, &canonical_number(n));
        }
        Value::String(s) => {
            hasher.update(&[TAG_STRING]);
            write_str(hasher, s);
        }
        Value::Array(items) => {
            hasher.update(&[TAG_ARRAY]);
            write_len(hasher, items.len());
            for item in items {
                write_value(hasher, item, excluded);
            }
        }
        Value::Object(fields) => {
            let mut keys: Vec<&String> = fields
                .keys()
                .filter(|k| !excluded.contains(&k.as_str()))
                .collect();
            keys.sort_unstable();
            hasher.update(&[TAG_OBJECT]);
            write_len(hasher, keys.len());
            for key in keys {
                write_str(hasher, key);
                write_value(hasher, &fields[key.as_str()], excluded);
            }
        }
    }
}
