//! Lit Shader Options
//!
//! Every toggle of the shared lit backend: render pass, vertex inputs, lights,
//! clustered lighting, surface model, blending. Frontends (the standard
//! material) embed a [`LitShaderOptions`] and fill it through the option
//! builder.

use serde::{Deserialize, Serialize};

use crate::resources::{LightDescriptor, LightType, ShadowType, TextureEncoding};

/// Declares a serde enum whose `name()` is the value emitted into defines.
macro_rules! define_name_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Define value of the variant.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }
    };
}

define_name_enum! {
    /// Framebuffer blend mode of the material.
    pub enum BlendType {
        #[default]
        None => "NONE",
        Normal => "NORMAL",
        Additive => "ADDITIVE",
        Premultiplied => "PREMULTIPLIED",
        Multiplicative => "MULTIPLICATIVE",
        Screen => "SCREEN",
    }
}

define_name_enum! {
    pub enum FresnelModel {
        None => "NONE",
        #[default]
        Schlick => "SCHLICK",
    }
}

define_name_enum! {
    /// Where the ambient term comes from.
    pub enum AmbientSource {
        #[default]
        Constant => "CONSTANT",
        EnvAtlas => "ENVATLAS",
        AmbientSh => "AMBIENTSH",
    }
}

define_name_enum! {
    pub enum ReflectionSource {
        #[default]
        None => "NONE",
        EnvAtlas => "ENVATLAS",
        EnvAtlasHq => "ENVATLASHQ",
        Cubemap => "CUBEMAP",
        Sphere => "SPHEREMAP",
    }
}

define_name_enum! {
    pub enum CubemapProjection {
        #[default]
        None => "NONE",
        Box => "BOX",
    }
}

define_name_enum! {
    pub enum OccludeSpecular {
        None => "NONE",
        #[default]
        Ao => "AO",
        GlossDependent => "GLOSSDEPENDENT",
    }
}

define_name_enum! {
    /// Sprite nine-slicing mode.
    pub enum NineSlicedMode {
        #[default]
        None => "NONE",
        Sliced => "SLICED",
        Tiled => "TILED",
    }
}

define_name_enum! {
    /// Opacity dithering pattern.
    pub enum DitherMode {
        #[default]
        None => "NONE",
        Bayer8 => "BAYER8",
        BlueNoise => "BLUENOISE",
        IgnNoise => "IGNNOISE",
    }
}

/// The render pass a program variant is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShaderPass {
    #[default]
    Forward,
    Depth,
    Pick,
    Prepass,
    Shadow {
        light_type: LightType,
        shadow_type: ShadowType,
    },
}

impl ShaderPass {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ShaderPass::Forward => "forward",
            ShaderPass::Depth => "depth",
            ShaderPass::Pick => "pick",
            ShaderPass::Prepass => "prepass",
            ShaderPass::Shadow { .. } => "shadow",
        }
    }

    /// The define identifying the pass in generated code.
    #[must_use]
    pub const fn define(self) -> &'static str {
        match self {
            ShaderPass::Forward => "FORWARD_PASS",
            ShaderPass::Depth => "DEPTH_PASS",
            ShaderPass::Pick => "PICK_PASS",
            ShaderPass::Prepass => "PREPASS_PASS",
            ShaderPass::Shadow { .. } => "SHADOW_PASS",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_forward(self) -> bool {
        matches!(self, ShaderPass::Forward)
    }

    #[inline]
    #[must_use]
    pub const fn is_shadow(self) -> bool {
        matches!(self, ShaderPass::Shadow { .. })
    }

    /// Shadow passes of directional lights, and of spot lights rendering a
    /// non-VSM shadow, store perspective depth instead of linear depth.
    #[must_use]
    pub const fn perspective_depth(self) -> bool {
        match self {
            ShaderPass::Shadow {
                light_type,
                shadow_type,
            } => {
                matches!(light_type, LightType::Directional)
                    || (matches!(light_type, LightType::Spot) && !shadow_type.is_vsm())
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for ShaderPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Options of the lit backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LitShaderOptions {
    pub pass: ShaderPass,

    // ---- Vertex inputs ----
    pub vertex_colors: bool,
    /// Vertex colors are stored in gamma space.
    pub vertex_color_gamma: bool,
    pub has_tangents: bool,
    pub skin: bool,
    pub use_instancing: bool,
    pub use_morph_position: bool,
    pub use_morph_normal: bool,
    pub use_morph_texture_based_int: bool,
    pub screen_space: bool,
    pub pixel_snap: bool,
    pub nine_sliced_mode: NineSlicedMode,
    pub msdf: bool,
    pub linear_depth: bool,

    // ---- Lighting ----
    pub lights: Vec<LightDescriptor>,
    pub clustered_lighting: bool,
    pub clustered_cookies: bool,
    pub clustered_shadows: bool,
    pub clustered_shadow_type: ShadowType,
    pub clustered_area_lights: bool,
    /// The mesh accepts dynamic lights (as opposed to lightmapped ones).
    pub light_mask_dynamic: bool,
    pub lightmap: bool,
    pub dir_lightmap: bool,
    pub lightmap_without_ambient: bool,

    // ---- Ambient & reflections ----
    pub ambient_source: AmbientSource,
    pub ambient_encoding: Option<TextureEncoding>,
    pub reflection_source: ReflectionSource,
    pub reflection_encoding: Option<TextureEncoding>,
    pub reflection_cubemap_encoding: Option<TextureEncoding>,
    pub cubemap_projection: CubemapProjection,
    pub cubemap_rotation: bool,

    // ---- Surface ----
    pub use_specular: bool,
    pub use_specular_color: bool,
    pub use_metalness: bool,
    pub use_specularity_factor: bool,
    pub use_sheen: bool,
    pub use_clear_coat: bool,
    pub use_clear_coat_normals: bool,
    pub use_iridescence: bool,
    pub use_refraction: bool,
    pub use_normals: bool,
    pub use_heights: bool,
    pub use_ao: bool,
    pub enable_ggx_specular: bool,
    pub fresnel_model: FresnelModel,
    pub occlude_specular: OccludeSpecular,
    pub occlude_direct: bool,
    pub two_sided_lighting: bool,

    // ---- Blending ----
    pub blend_type: BlendType,
    pub alpha_test: bool,
    pub alpha_to_coverage: bool,
    pub opacity_dither: DitherMode,
    pub opacity_shadow_dither: DitherMode,
}

impl Default for LitShaderOptions {
    fn default() -> Self {
        Self {
            pass: ShaderPass::Forward,
            vertex_colors: false,
            vertex_color_gamma: false,
            has_tangents: false,
            skin: false,
            use_instancing: false,
            use_morph_position: false,
            use_morph_normal: false,
            use_morph_texture_based_int: false,
            screen_space: false,
            pixel_snap: false,
            nine_sliced_mode: NineSlicedMode::None,
            msdf: false,
            linear_depth: false,
            lights: Vec::new(),
            clustered_lighting: false,
            clustered_cookies: false,
            clustered_shadows: false,
            clustered_shadow_type: ShadowType::Pcf3F32,
            clustered_area_lights: false,
            light_mask_dynamic: true,
            lightmap: false,
            dir_lightmap: false,
            lightmap_without_ambient: false,
            ambient_source: AmbientSource::Constant,
            ambient_encoding: None,
            reflection_source: ReflectionSource::None,
            reflection_encoding: None,
            reflection_cubemap_encoding: None,
            cubemap_projection: CubemapProjection::None,
            cubemap_rotation: false,
            use_specular: true,
            use_specular_color: false,
            use_metalness: false,
            use_specularity_factor: false,
            use_sheen: false,
            use_clear_coat: false,
            use_clear_coat_normals: false,
            use_iridescence: false,
            use_refraction: false,
            use_normals: false,
            use_heights: false,
            use_ao: false,
            enable_ggx_specular: false,
            fresnel_model: FresnelModel::Schlick,
            occlude_specular: OccludeSpecular::Ao,
            occlude_direct: false,
            two_sided_lighting: false,
            blend_type: BlendType::None,
            alpha_test: false,
            alpha_to_coverage: false,
            opacity_dither: DitherMode::None,
            opacity_shadow_dither: DitherMode::None,
        }
    }
}

impl LitShaderOptions {
    /// Lights resolved through explicit per-light code.
    ///
    /// With clustered lighting only directional lights stay explicit; every
    /// other light is handled by the cluster lookup.
    pub fn explicit_lights(&self) -> impl Iterator<Item = &LightDescriptor> + '_ {
        let clustered = self.clustered_lighting;
        self.lights
            .iter()
            .filter(move |light| !clustered || light.light_type == LightType::Directional)
    }

    /// Any direct or baked-directional lighting is evaluated.
    #[must_use]
    pub fn lighting(&self) -> bool {
        !self.lights.is_empty() || self.dir_lightmap || self.clustered_lighting
    }

    #[must_use]
    pub fn reflections(&self) -> bool {
        self.reflection_source != ReflectionSource::None
    }

    /// The fragment stage needs a world-space normal.
    #[must_use]
    pub fn needs_normal(&self) -> bool {
        let shadow = self.pass.is_shadow();
        (self.lighting()
            || self.reflections()
            || self.use_specular
            || self.ambient_source == AmbientSource::AmbientSh
            || self.use_heights
            || self.enable_ggx_specular
            || (self.clustered_lighting && !shadow)
            || self.use_clear_coat_normals)
            && !shadow
    }

    /// Opacity has to be evaluated by the frontend.
    #[must_use]
    pub fn needs_opacity(&self) -> bool {
        match self.pass {
            ShaderPass::Forward => {
                self.blend_type != BlendType::None
                    || self.alpha_test
                    || self.alpha_to_coverage
                    || self.opacity_dither != DitherMode::None
            }
            ShaderPass::Shadow { .. } => {
                self.alpha_test || self.opacity_shadow_dither != DitherMode::None
            }
            _ => self.alpha_test,
        }
    }

    /// The dither pattern active in the current pass.
    #[must_use]
    pub fn active_dither(&self) -> DitherMode {
        match self.pass {
            ShaderPass::Forward => self.opacity_dither,
            ShaderPass::Shadow { .. } => self.opacity_shadow_dither,
            _ => DitherMode::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(BlendType::Premultiplied.name(), "PREMULTIPLIED");
        assert_eq!(AmbientSource::AmbientSh.name(), "AMBIENTSH");
        assert_eq!(DitherMode::default(), DitherMode::None);
        assert_eq!(
            serde_json::to_string(&ReflectionSource::EnvAtlasHq).unwrap(),
            "\"env_atlas_hq\""
        );
    }

    #[test]
    fn test_perspective_depth() {
        let directional = ShaderPass::Shadow {
            light_type: LightType::Directional,
            shadow_type: ShadowType::Vsm16F,
        };
        let spot_vsm = ShaderPass::Shadow {
            light_type: LightType::Spot,
            shadow_type: ShadowType::Vsm16F,
        };
        let spot_pcf = ShaderPass::Shadow {
            light_type: LightType::Spot,
            shadow_type: ShadowType::Pcf3F32,
        };
        let omni = ShaderPass::Shadow {
            light_type: LightType::Omni,
            shadow_type: ShadowType::Pcf3F32,
        };
        assert!(directional.perspective_depth());
        assert!(!spot_vsm.perspective_depth());
        assert!(spot_pcf.perspective_depth());
        assert!(!omni.perspective_depth());
        assert!(!ShaderPass::Forward.perspective_depth());
    }

    #[test]
    fn test_explicit_lights_with_clustering() {
        let mut options = LitShaderOptions {
            lights: vec![
                LightDescriptor::omni(),
                LightDescriptor::directional(),
                LightDescriptor::spot(),
            ],
            ..Default::default()
        };
        assert_eq!(options.explicit_lights().count(), 3);

        options.clustered_lighting = true;
        let explicit: Vec<_> = options.explicit_lights().collect();
        assert_eq!(explicit.len(), 1);
        assert_eq!(explicit[0].light_type, LightType::Directional);
    }

    #[test]
    fn test_shadow_pass_never_needs_normal() {
        let options = LitShaderOptions {
            pass: ShaderPass::Shadow {
                light_type: LightType::Spot,
                shadow_type: ShadowType::Pcf3F32,
            },
            lights: vec![LightDescriptor::spot()],
            ..Default::default()
        };
        assert!(!options.needs_normal());
        assert!(LitShaderOptions::default().needs_normal());
    }
}
