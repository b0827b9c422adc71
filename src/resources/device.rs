//! Device Capability Description
//!
//! The shader library never talks to a graphics device. The host engine
//! describes the device once through [`DeviceCapabilities`] and the program
//! cache binds that description for its whole lifetime.

use serde::{Deserialize, Serialize};

use super::shader_defines::ShaderDefines;

/// Target shading language of a generated program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderLanguage {
    Glsl,
    Wgsl,
}

impl ShaderLanguage {
    /// Directory name of the embedded chunk set for this language.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ShaderLanguage::Glsl => "glsl",
            ShaderLanguage::Wgsl => "wgsl",
        }
    }
}

impl std::fmt::Display for ShaderLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Floating point precision tier.
///
/// Ordered so that `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Low,
    Medium,
    #[default]
    High,
}

impl Precision {
    #[must_use]
    pub const fn qualifier(self) -> &'static str {
        match self {
            Precision::Low => "lowp",
            Precision::Medium => "mediump",
            Precision::High => "highp",
        }
    }

    /// Degrades `self` one tier at a time until it is supported by a device
    /// whose best tier is `max`.
    #[must_use]
    pub fn resolve(self, max: Precision) -> Precision {
        let mut precision = self;
        while precision > max {
            precision = match precision {
                Precision::High => Precision::Medium,
                Precision::Medium | Precision::Low => Precision::Low,
            };
        }
        precision
    }
}

/// What the host device can do, as far as generated source is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceCapabilities {
    /// Modern (WebGPU/Vulkan class) backend vs. compatibility (GLES3 class).
    pub is_modern_backend: bool,
    /// Number of color attachments a fragment stage may write.
    pub max_color_attachments: u32,
    /// Best precision tier the device supports.
    pub max_precision: Precision,
    pub supports_sampler_2d_array: bool,
    pub texture_float_renderable: bool,
    pub texture_float_filterable: bool,
    pub supports_depth_clamp: bool,
    /// Extra host-provided capability defines.
    pub extra_defines: ShaderDefines,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self::compatibility()
    }
}

impl DeviceCapabilities {
    /// A WebGPU class device.
    #[must_use]
    pub fn modern() -> Self {
        Self {
            is_modern_backend: true,
            max_color_attachments: 8,
            max_precision: Precision::High,
            supports_sampler_2d_array: true,
            texture_float_renderable: true,
            texture_float_filterable: true,
            supports_depth_clamp: true,
            extra_defines: ShaderDefines::new(),
        }
    }

    /// A WebGL2 / GLES3 class device.
    #[must_use]
    pub fn compatibility() -> Self {
        Self {
            is_modern_backend: false,
            max_color_attachments: 4,
            max_precision: Precision::High,
            supports_sampler_2d_array: true,
            texture_float_renderable: false,
            texture_float_filterable: false,
            supports_depth_clamp: false,
            extra_defines: ShaderDefines::new(),
        }
    }

    /// Language used for programs generated for this device.
    ///
    /// Modern backends accept both languages; `prefer_wgsl` picks between them.
    /// Compatibility backends only accept GLSL.
    #[must_use]
    pub fn shader_language(&self, prefer_wgsl: bool) -> ShaderLanguage {
        if self.is_modern_backend && prefer_wgsl {
            ShaderLanguage::Wgsl
        } else {
            ShaderLanguage::Glsl
        }
    }

    /// The device-capability defines layer, emitted before any stage define.
    #[must_use]
    pub fn caps_defines(&self) -> ShaderDefines {
        let mut defines = self.extra_defines.clone();
        defines.set_if(self.texture_float_renderable, "CAPS_TEXTURE_FLOAT_RENDERABLE");
        defines.set_if(self.texture_float_filterable, "CAPS_TEXTURE_FLOAT_FILTERABLE");
        defines.set_if(self.supports_depth_clamp, "CAPS_DEPTH_CLAMP");
        defines.set_if(self.supports_sampler_2d_array, "CAPS_SAMPLER_2D_ARRAY");
        defines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_degrades_one_tier_at_a_time() {
        assert_eq!(Precision::High.resolve(Precision::High), Precision::High);
        assert_eq!(Precision::High.resolve(Precision::Medium), Precision::Medium);
        assert_eq!(Precision::Medium.resolve(Precision::Low), Precision::Low);
        assert_eq!(Precision::High.resolve(Precision::Low), Precision::Low);
        assert_eq!(Precision::Low.resolve(Precision::High), Precision::Low);
    }

    #[test]
    fn test_language_selection() {
        assert_eq!(
            DeviceCapabilities::modern().shader_language(true),
            ShaderLanguage::Wgsl
        );
        assert_eq!(
            DeviceCapabilities::modern().shader_language(false),
            ShaderLanguage::Glsl
        );
        assert_eq!(
            DeviceCapabilities::compatibility().shader_language(true),
            ShaderLanguage::Glsl
        );
    }

    #[test]
    fn test_caps_defines() {
        let mut caps = DeviceCapabilities::modern();
        caps.extra_defines.set("CAPS_CUSTOM", "2");
        let defines = caps.caps_defines();
        assert!(defines.contains("CAPS_TEXTURE_FLOAT_RENDERABLE"));
        assert_eq!(defines.get("CAPS_CUSTOM"), Some("2"));

        let compat = DeviceCapabilities::compatibility().caps_defines();
        assert!(!compat.contains("CAPS_TEXTURE_FLOAT_RENDERABLE"));
    }

    #[test]
    fn test_deserialize_partial() {
        let caps: DeviceCapabilities =
            serde_json::from_str(r#"{ "is_modern_backend": true, "max_precision": "medium" }"#)
                .unwrap();
        assert!(caps.is_modern_backend);
        assert_eq!(caps.max_precision, Precision::Medium);
        assert_eq!(caps.max_color_attachments, 4);
    }
}
