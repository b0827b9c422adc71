//! Standard Material Options
//!
//! The option record of the standard (physically based) material frontend:
//! the lit backend options plus one [`TextureMapOptions`] per texture slot.

use serde::{Deserialize, Serialize};

use crate::resources::{TextureMapOptions, texture_slot};
use crate::shader_lib::options::lit::LitShaderOptions;

/// How tangent-space normal maps are packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalFormat {
    /// Two channels (`wy`), z reconstructed.
    #[default]
    Xy,
    Xyz,
}

impl NormalFormat {
    /// Chunk providing `unpackNormal`.
    #[must_use]
    pub const fn chunk(self) -> &'static str {
        match self {
            NormalFormat::Xy => "normalXYPS",
            NormalFormat::Xyz => "normalXYZPS",
        }
    }
}

/// Options of the standard material generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardMaterialOptions {
    pub lit: LitShaderOptions,
    /// Texture slots. After option building: one entry per known slot, in
    /// slot order.
    pub maps: Vec<TextureMapOptions>,
    /// Packing of the normal, normal detail and clear coat normal maps.
    pub normal_format: NormalFormat,
    /// Set by [`prepare_standard`](crate::shader_lib::options::prepare_standard).
    /// Sampler groups and the slot-ordered map list are only valid when set.
    pub prepared: bool,
}

impl StandardMaterialOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the options of one slot.
    #[must_use]
    pub fn with_map(mut self, map: TextureMapOptions) -> Self {
        match self.maps.iter_mut().find(|m| m.base_name == map.base_name) {
            Some(existing) => *existing = map,
            None => self.maps.push(map),
        }
        self
    }

    #[must_use]
    pub fn with_lit(mut self, lit: LitShaderOptions) -> Self {
        self.lit = lit;
        self
    }

    /// Options of slot `base_name`, if present.
    #[must_use]
    pub fn map(&self, base_name: &str) -> Option<&TextureMapOptions> {
        self.maps.iter().find(|m| m.base_name == base_name)
    }

    /// A texture is bound to slot `base_name`.
    #[must_use]
    pub fn has_texture(&self, base_name: &str) -> bool {
        self.map(base_name).is_some_and(|m| m.enabled)
    }

    /// Options of slot `base_name`, falling back to the slot defaults.
    #[must_use]
    pub fn map_or_default(&self, base_name: &str) -> TextureMapOptions {
        self.map(base_name)
            .cloned()
            .unwrap_or_else(|| TextureMapOptions::new(base_name))
    }

    /// Whether `base_name` names a known slot.
    #[must_use]
    pub fn is_known_slot(base_name: &str) -> bool {
        texture_slot(base_name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_map_replaces_existing_slot() {
        let options = StandardMaterialOptions::new()
            .with_map(TextureMapOptions::new("diffuse").with_texture(1))
            .with_map(TextureMapOptions::new("diffuse").with_texture(2).with_uv(1));
        assert_eq!(options.maps.len(), 1);
        assert_eq!(options.map("diffuse").unwrap().uv, 1);
        assert!(options.has_texture("diffuse"));
        assert!(!options.has_texture("normal"));
        assert_eq!(options.map_or_default("light").uv, 1);
    }

    #[test]
    fn test_options_deserialize_partially() {
        let json = r#"{ "lit": { "alpha_test": true }, "normal_format": "xyz" }"#;
        let options: StandardMaterialOptions = serde_json::from_str(json).unwrap();
        assert!(options.lit.alpha_test);
        assert!(options.lit.use_specular);
        assert_eq!(options.normal_format, NormalFormat::Xyz);
    }
}
