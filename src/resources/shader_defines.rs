//! Shader Macro Definition System
//!
//! Provides the ordered defines map used for every shader stage.
//! Uses string interning so cloning and merging never copies strings.
//!
//! # Architecture
//!
//! Entries are stored as `(Symbol, Symbol)` pairs kept sorted by the **key
//! string**, so:
//!
//! - **Emission is deterministic**: `#define` lines always come out in the same
//!   order regardless of insertion order
//! - **Hashing is order independent**: [`ShaderDefines::defines_hash`] matches
//!   for maps holding the same pairs
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_shaderlib::resources::ShaderDefines;
//!
//! let mut defines = ShaderDefines::new();
//! defines.set("LIGHT_COUNT", "2");
//! defines.set_flag("LIT_SPECULAR");
//!
//! let hash = defines.defines_hash();
//! ```

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::hash;
use crate::utils::interner::{self, Symbol};

/// A collection of shader macro definitions, sorted by name.
#[derive(Debug, Clone, Default)]
pub struct ShaderDefines {
    defines: Vec<(Symbol, Symbol)>,
}

impl ShaderDefines {
    /// Create empty shader defines collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            defines: Vec::new(),
        }
    }

    /// Create shader defines collection with pre-allocated capacity
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            defines: Vec::with_capacity(capacity),
        }
    }

    fn position(&self, key: &str) -> std::result::Result<usize, usize> {
        self.defines
            .binary_search_by(|&(k, _)| interner::resolve(k).cmp(key))
    }

    /// Set shader define (maintains sorted order)
    ///
    /// If key exists, updates its value; otherwise inserts new entry.
    pub fn set(&mut self, key: &str, value: &str) {
        let value_sym = interner::intern(value);
        match self.position(key) {
            Ok(idx) => self.defines[idx].1 = value_sym,
            Err(idx) => self.defines.insert(idx, (interner::intern(key), value_sym)),
        }
    }

    /// Set a value-less define (`#define NAME`).
    #[inline]
    pub fn set_flag(&mut self, key: &str) {
        self.set(key, "");
    }

    /// Set a value-less define when `condition` holds.
    #[inline]
    pub fn set_if(&mut self, condition: bool, key: &str) {
        if condition {
            self.set_flag(key);
        }
    }

    /// Remove shader define
    pub fn remove(&mut self, key: &str) -> bool {
        match self.position(key) {
            Ok(idx) => {
                self.defines.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    /// Check if contains a shader define
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_ok()
    }

    /// Get shader define value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.position(key)
            .ok()
            .map(|idx| interner::resolve(self.defines[idx].1))
    }

    /// Clear all shader defines
    #[inline]
    pub fn clear(&mut self) {
        self.defines.clear();
    }

    /// Get shader defines count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// Iterate all shader defines (as strings), sorted by name
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.defines
            .iter()
            .map(|&(k, v)| (interner::resolve(k), interner::resolve(v)))
    }

    /// Convert to `BTreeMap`
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Merge shader defines from another `ShaderDefines`
    ///
    /// If there are conflicts, values from other will override values in self.
    pub fn merge(&mut self, other: &ShaderDefines) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    /// Merge defines from `other` without overriding existing entries.
    ///
    /// Returns the names whose value in `other` differed from the kept one.
    pub fn merge_missing(&mut self, other: &ShaderDefines) -> Vec<&'static str> {
        let mut conflicts = Vec::new();
        for (key, value) in other.iter() {
            match self.get(key) {
                Some(existing) if existing != value => conflicts.push(key),
                Some(_) => {}
                None => self.set(key, value),
            }
        }
        conflicts
    }

    /// Create a new merged `ShaderDefines`
    #[must_use]
    pub fn merged_with(&self, other: &ShaderDefines) -> ShaderDefines {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    /// Insertion-order independent fingerprint of the defines.
    #[must_use]
    pub fn defines_hash(&self) -> i32 {
        hash::defines_hash(self.iter())
    }

    /// Emits one `#define NAME VALUE` line per entry.
    #[must_use]
    pub fn to_define_lines(&self) -> String {
        let mut code = String::new();
        for (key, value) in self.iter() {
            code.push_str("#define ");
            code.push_str(key);
            if !value.is_empty() {
                code.push(' ');
                code.push_str(value);
            }
            code.push('\n');
        }
        code
    }
}

impl Hash for ShaderDefines {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.defines.hash(state);
    }
}

impl PartialEq for ShaderDefines {
    fn eq(&self, other: &Self) -> bool {
        self.defines == other.defines
    }
}

impl Eq for ShaderDefines {}

/// Create `ShaderDefines` from list of macro definitions
impl From<&[(&str, &str)]> for ShaderDefines {
    fn from(defines: &[(&str, &str)]) -> Self {
        let mut result = Self::with_capacity(defines.len());
        for (k, v) in defines {
            result.set(k, v);
        }
        result
    }
}

impl Serialize for ShaderDefines {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for ShaderDefines {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut defines = Self::with_capacity(map.len());
        for (k, v) in &map {
            defines.set(k, v);
        }
        Ok(defines)
    }
}
