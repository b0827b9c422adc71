//! Utility Module
//!
//! - [`hash`]: the fingerprint engine (rolling string hash, defines hash,
//!   canonical key serialization)
//! - [`interner`]: string interning for define names and values
//!
//! # String Interning
//!
//! ```rust,ignore
//! use myth_shaderlib::utils::interner;
//!
//! let sym1 = interner::intern("LIT_SPECULAR");
//! let sym2 = interner::intern("LIT_SPECULAR");
//! assert_eq!(sym1, sym2); // O(1) comparison
//! ```

pub mod hash;
pub mod interner;

pub use hash::{
    KeyWidth, VariantKey, canonical_key_string, canonical_value_string, defines_hash, hash_code,
};
pub use interner::Symbol;
