//! Shader Library Settings
//!
//! Configuration consumed once when a [`ProgramCache`](crate::pipeline::ProgramCache)
//! is created. Settings are plain serde data so hosts can keep them in a
//! configuration file next to their [`DeviceCapabilities`](crate::resources::DeviceCapabilities).
//!
//! ```rust,ignore
//! use myth_shaderlib::settings::ShaderLibSettings;
//! use myth_shaderlib::utils::KeyWidth;
//!
//! let settings = ShaderLibSettings {
//!     key_width: KeyWidth::Wide,
//!     verify_keys: true,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::resources::Precision;
use crate::utils::KeyWidth;

/// Global configuration of a program cache.
///
/// | Field                 | Default  |
/// |-----------------------|----------|
/// | `key_width`           | `Narrow` |
/// | `verify_keys`         | `false`  |
/// | `record_programs`     | `true`   |
/// | `debug_print_shaders` | `false`  |
/// | `default_precision`   | `None`   |
/// | `prefer_wgsl`         | `true`   |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderLibSettings {
    /// Fingerprint width.
    ///
    /// `Narrow` is the 32-bit rolling hash. Distinct option records may
    /// collide; `Wide` (64-bit xxh3) or `verify_keys` make that negligible
    /// or detectable.
    pub key_width: KeyWidth,

    /// Remember the canonical key string of every cached entry and report a
    /// hit whose string differs as a collision.
    pub verify_keys: bool,

    /// Record every generated `(generator, options)` pair for
    /// [`dump_programs`](crate::pipeline::ProgramCache::dump_programs).
    pub record_programs: bool,

    /// Log every assembled stage at debug level.
    pub debug_print_shaders: bool,

    /// Precision requested from the assembler. `None` uses the device maximum.
    pub default_precision: Option<Precision>,

    /// Generate WGSL when the device is a modern backend.
    pub prefer_wgsl: bool,
}

impl Default for ShaderLibSettings {
    fn default() -> Self {
        Self {
            key_width: KeyWidth::Narrow,
            verify_keys: false,
            record_programs: true,
            debug_print_shaders: false,
            default_precision: None,
            prefer_wgsl: true,
        }
    }
}

impl ShaderLibSettings {
    /// Parses settings from JSON; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings =
            ShaderLibSettings::from_json(r#"{ "key_width": "wide", "default_precision": "medium" }"#)
                .unwrap();
        assert_eq!(settings.key_width, KeyWidth::Wide);
        assert_eq!(settings.default_precision, Some(Precision::Medium));
        assert!(settings.record_programs);
        assert!(!settings.verify_keys);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(ShaderLibSettings::from_json("{ key_width: 1 }").is_err());
    }
}
