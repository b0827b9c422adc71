//! Fingerprint Engine
//!
//! Deterministic string → integer hashing used to build program cache keys.
//!
//! # Known limitation
//!
//! The default [`KeyWidth::Narrow`] fingerprint is a 32-bit rolling hash with no
//! collision verification: two distinct option records may produce the same
//! key and retrieve the wrong cached program. [`KeyWidth::Wide`] widens the key
//! to 64 bits (xxh3) and the program cache can additionally verify the
//! canonical key string on every hit
//! (see [`ShaderLibSettings`](crate::settings::ShaderLibSettings)).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::Result;

/// Classic rolling string hash: `h = (h << 5) - h + code_unit`, truncated to
/// 32 bits at every step.
///
/// Operates on UTF-16 code units so keys match those produced by tools that
/// hash the same canonical strings. The empty string hashes to `0`.
#[must_use]
pub fn hash_code(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |h, unit| {
        (h << 5).wrapping_sub(h).wrapping_add(i32::from(unit))
    })
}

/// Hashes a defines map independently of its insertion order.
///
/// Entries are sorted by key (then value) before serialization.
#[must_use]
pub fn defines_hash<'a, I>(defines: I) -> i32
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut entries: Vec<(&str, &str)> = defines.into_iter().collect();
    entries.sort_unstable();

    let mut text = String::new();
    for (key, value) in entries {
        text.push_str(key);
        text.push('=');
        text.push_str(value);
        text.push('\n');
    }
    hash_code(&text)
}

/// Width of the program cache fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyWidth {
    /// 32-bit rolling hash ([`hash_code`]).
    #[default]
    Narrow,
    /// 64-bit xxh3 of the same canonical string.
    Wide,
}

/// Fingerprint of an option record, used to index the program cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey(u64);

impl VariantKey {
    /// Builds a key from a canonical key string.
    #[must_use]
    pub fn from_key_string(text: &str, width: KeyWidth) -> Self {
        match width {
            KeyWidth::Narrow => Self(u64::from(hash_code(text) as u32)),
            KeyWidth::Wide => Self(xxh3_64(text.as_bytes())),
        }
    }

    /// Wraps a precomputed key value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw key value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Serializes a record into its canonical key form: one `path:value` line per
/// reachable scalar field, sorted by field path.
///
/// Fields marked `#[serde(skip)]` (volatile state such as texture object
/// identity) never reach the key.
pub fn canonical_key_string<T: Serialize>(record: &T) -> Result<String> {
    let value = serde_json::to_value(record)?;
    Ok(canonical_value_string(&value))
}

/// [`canonical_key_string`] for an already serialized record, so callers can
/// reshape the value (drop or replace fields) before it is flattened.
#[must_use]
pub fn canonical_value_string(value: &Value) -> String {
    let mut lines = Vec::new();
    flatten_value("", value, &mut lines);
    lines.sort_unstable();
    lines.join("\n")
}

fn flatten_value(path: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (name, field) in map {
                let child = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{path}.{name}")
                };
                flatten_value(&child, field, out);
            }
        }
        Value::Array(items) => {
            // zero-padded so lexical sorting keeps element order
            out.push(format!("{path}.len:{}", items.len()));
            for (index, item) in items.iter().enumerate() {
                flatten_value(&format!("{path}.{index:04}"), item, out);
            }
        }
        Value::Null => out.push(format!("{path}:~")),
        Value::Bool(b) => out.push(format!("{path}:{b}")),
        Value::Number(n) => out.push(format!("{path}:{n}")),
        Value::String(s) => out.push(format!("{path}:{s}")),
    }
}
