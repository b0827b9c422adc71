//! Lit Backend
//!
//! Shared vertex and fragment generation for lit shading families. A frontend
//! (the standard material) supplies the surface code through
//! [`FrontendCode`]; the backend owns everything else:
//!
//! - varyings and vertex attributes
//! - vertex, pass, lighting and clustered-lighting defines
//! - per-light declarations and evaluations, unrolled once per explicit light
//! - the `litMainVS` / `litMainPS` entry points
//!
//! Both stages are produced as [`StageSource`]s and handed to the assembler
//! through [`LitShader::into_request`].

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::errors::{Result, ShaderLibError};
use crate::resources::{LightType, ShaderDefines, ShaderLanguage};
use crate::shader_lib::assembler::{AssembleRequest, StageSource};
use crate::shader_lib::definition::{Semantic, glsl_to_wgsl_type};
use crate::shader_lib::options::{
    DitherMode, LitShaderOptions, MAX_UV_SETS, NineSlicedMode, ShaderPass, UvUsage,
};
use crate::shader_lib::programs::GenerationContext;
use crate::shader_lib::template::{SubstitutionTable, render, render_indexed};

/// Surface code supplied by a frontend.
#[derive(Debug, Clone, Default)]
pub struct FrontendCode {
    /// Globals, uniforms and samplers, emitted ahead of the light code.
    pub declarations: String,
    /// Frontend functions, ending with `evaluateFrontend`.
    pub code: String,
    /// UV expression used to derive a tangent frame without vertex tangents.
    pub lighting_uv: Option<String>,
}

#[derive(Debug, Clone)]
struct Varying {
    name: String,
    /// GLSL type; mapped for WGSL output.
    ty: &'static str,
}

/// Builds the two stages of a lit program.
pub struct LitShader<'a> {
    ctx: &'a GenerationContext<'a>,
    options: &'a LitShaderOptions,
    varyings: Vec<Varying>,
    attributes: BTreeMap<String, Semantic>,
    vertex_defines: ShaderDefines,
    fragment_defines: ShaderDefines,
    vertex_code: String,
    fragment_code: String,
}

const INSTANCE_ATTRIBUTES: [(&str, u8); 4] = [
    ("instance_line1", 11),
    ("instance_line2", 12),
    ("instance_line3", 14),
    ("instance_line4", 15),
];

impl<'a> LitShader<'a> {
    #[must_use]
    pub fn new(ctx: &'a GenerationContext<'a>, options: &'a LitShaderOptions) -> Self {
        Self {
            ctx,
            options,
            varyings: Vec::new(),
            attributes: BTreeMap::new(),
            vertex_defines: ShaderDefines::new(),
            fragment_defines: ShaderDefines::new(),
            vertex_code: String::new(),
            fragment_code: String::new(),
        }
    }

    #[must_use]
    pub fn vertex_defines(&self) -> &ShaderDefines {
        &self.vertex_defines
    }

    #[must_use]
    pub fn fragment_defines(&self) -> &ShaderDefines {
        &self.fragment_defines
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Semantic> {
        &self.attributes
    }

    #[must_use]
    pub fn vertex_code(&self) -> &str {
        &self.vertex_code
    }

    #[must_use]
    pub fn fragment_code(&self) -> &str {
        &self.fragment_code
    }

    fn add_attribute(&mut self, name: &str, semantic: Semantic) {
        self.attributes.insert(name.to_string(), semantic);
    }

    /// Registers a varying; declared identically in both stages.
    fn add_varying(&mut self, name: impl Into<String>, ty: &'static str) {
        let name = name.into();
        if self.varyings.iter().any(|v| v.name == name) {
            return;
        }
        let define = format!("VARYING_{}", name.to_uppercase());
        self.vertex_defines.set_flag(&define);
        self.fragment_defines.set_flag(&define);
        self.varyings.push(Varying { name, ty });
    }

    fn varying_declarations(&self) -> Result<String> {
        let mut out = String::new();
        for varying in &self.varyings {
            match self.ctx.language {
                ShaderLanguage::Glsl => {
                    let _ = writeln!(out, "varying {} {};", varying.ty, varying.name);
                }
                ShaderLanguage::Wgsl => {
                    let ty = glsl_to_wgsl_type(varying.ty).ok_or_else(|| {
                        ShaderLibError::InvalidOption(format!("varying type '{}'", varying.ty))
                    })?;
                    let _ = writeln!(out, "varying {}: {ty};", varying.name);
                }
            }
        }
        Ok(out)
    }

    // ========================================================================
    // Vertex stage
    // ========================================================================

    /// Generates the vertex stage for the given UV usage.
    pub fn generate_vertex(&mut self, uv: &UvUsage) -> Result<()> {
        let ctx = self.ctx;
        let options = self.options;

        self.vertex_defines.set_flag(options.pass.define());
        self.add_attribute("vertex_position", Semantic::Position);
        self.add_varying("vPositionW", "vec3");

        if options.needs_normal() {
            self.vertex_defines.set_flag("NORMALS");
            self.add_attribute("vertex_normal", Semantic::Normal);
            self.add_varying("vNormalW", "vec3");

            if options.has_tangents
                && (options.use_heights
                    || options.use_normals
                    || options.use_clear_coat_normals
                    || options.enable_ggx_specular)
            {
                self.vertex_defines.set_flag("TANGENTS");
                self.add_attribute("vertex_tangent", Semantic::Tangent);
                self.add_varying("vTangentW", "vec3");
                self.add_varying("vBinormalW", "vec3");
            }
            self.vertex_defines
                .set_if(options.enable_ggx_specular, "GGX_SPECULAR");
        }

        let nine_sliced = options.nine_sliced_mode != NineSlicedMode::None;
        let mut used_uv = uv.used_uv;
        used_uv[0] |= nine_sliced;
        for set in 0..MAX_UV_SETS {
            if used_uv[set] {
                self.vertex_defines.set_flag(&format!("UV{set}"));
                let semantic = if set == 0 {
                    Semantic::TexCoord0
                } else {
                    Semantic::TexCoord1
                };
                self.add_attribute(&format!("vertex_texCoord{set}"), semantic);
            }
            if uv.used_unmodified_uv[set] {
                self.vertex_defines
                    .set_flag(&format!("UV{set}_UNMODIFIED"));
                self.add_varying(format!("vUv{set}"), "vec2");
            }
        }

        if nine_sliced {
            self.vertex_defines.set_flag("NINESLICED");
            self.vertex_defines
                .set_if(options.nine_sliced_mode == NineSlicedMode::Tiled, "NINESLICE_TILED");
            self.add_varying("vTiledUv", "vec2");
        }

        if options.vertex_colors {
            self.vertex_defines.set_flag("VERTEX_COLOR");
            self.add_attribute("vertex_color", Semantic::Color);
            self.add_varying("vVertexColor", "vec4");
        }

        if options.skin {
            self.vertex_defines.set_flag("SKIN");
            self.add_attribute("vertex_boneWeights", Semantic::BlendWeight);
            self.add_attribute("vertex_boneIndices", Semantic::BlendIndices);
        }

        if options.use_instancing {
            self.vertex_defines.set_flag("INSTANCING");
            for (name, slot) in INSTANCE_ATTRIBUTES {
                self.add_attribute(name, Semantic::Attr(slot));
            }
        }

        if options.use_morph_position || options.use_morph_normal {
            self.vertex_defines.set_flag("MORPHING");
            self.vertex_defines
                .set_if(options.use_morph_position, "MORPHING_POSITION");
            self.vertex_defines
                .set_if(options.use_morph_normal, "MORPHING_NORMAL");
            self.vertex_defines
                .set_if(options.use_morph_texture_based_int, "MORPHING_INT");
            self.add_attribute("morph_vertex_id", Semantic::Attr(15));
        }

        if options.msdf {
            self.vertex_defines.set_flag("MSDF");
            self.add_attribute("vertex_outlineParameters", Semantic::Attr(8));
            self.add_attribute("vertex_shadowParameters", Semantic::Attr(9));
        }

        self.vertex_defines
            .set_if(options.screen_space, "SCREENSPACE");
        self.vertex_defines.set_if(options.pixel_snap, "PIXELSNAP");

        // shadow passes always store linear depth for the non-perspective path
        if options.linear_depth || options.pass.is_shadow() {
            self.vertex_defines.set_flag("LINEAR_DEPTH");
            self.add_varying("vLinearDepth", "float");
        }

        let count = uv.transform_count();
        self.vertex_defines
            .set("UV_TRANSFORMS_COUNT", &count.to_string());
        let mut table = SubstitutionTable::new();
        for (i, transform) in uv.transforms.iter().enumerate() {
            table.insert(format!("TRANSFORM_NAME_{i}"), transform.name.as_str());
            table.insert(format!("TRANSFORM_UV_{i}"), transform.uv.to_string());
            table.insert(format!("TRANSFORM_ID_{i}"), transform.id.to_string());
            self.add_varying(transform.varying(), "vec2");
        }
        let uniforms = render_indexed(ctx.chunk("uvTransformUniformsVS")?, 0..count, &table);
        let transforms = render_indexed(ctx.chunk("uvTransformVS")?, 0..count, &table);

        table.insert("varyings", self.varying_declarations()?);
        table.insert("uvTransformUniforms", uniforms);
        table.insert("uvTransforms", transforms);
        self.vertex_code = render(ctx.chunk("litMainVS")?, &table);
        Ok(())
    }

    // ========================================================================
    // Fragment stage
    // ========================================================================

    /// Generates the fragment stage around `frontend`. Call after
    /// [`generate_vertex`](Self::generate_vertex) so both stages share the
    /// same varyings.
    pub fn generate_fragment(&mut self, frontend: &FrontendCode) -> Result<()> {
        let ctx = self.ctx;
        let options = self.options;
        let mut table = SubstitutionTable::new();

        self.fragment_defines.set_flag(options.pass.define());

        let (declarations, evaluations, functions, clustered) = if options.pass.is_forward() {
            self.add_forward_defines();
            let light_count = self.add_light_defines(&mut table);
            let clustered = self.add_clustered_defines();

            let declarations =
                render_indexed(ctx.chunk("lightDeclarationPS")?, 0..light_count, &table);
            let evaluations =
                render_indexed(ctx.chunk("lightEvaluationPS")?, 0..light_count, &table);
            let functions = if light_count > 0 {
                ctx.chunk("lightFunctionsPS")?
            } else {
                ""
            };
            let clustered = if clustered {
                ctx.chunk("clusteredLightPS")?
            } else {
                ""
            };
            (declarations, evaluations, functions, clustered)
        } else {
            self.add_pass_defines();
            (String::new(), String::new(), "", "")
        };

        match options.active_dither() {
            DitherMode::None => {}
            dither => self
                .fragment_defines
                .set_flag(&format!("DITHER_{}", dither.name())),
        }

        let default_uv = match ctx.language {
            ShaderLanguage::Glsl => "vec2(0.0)",
            ShaderLanguage::Wgsl => "vec2f(0.0)",
        };
        let lighting_uv = frontend.lighting_uv.as_deref().unwrap_or(default_uv);
        let ambient_decode = options
            .ambient_encoding
            .map_or("decodeGamma", |e| e.decode_func());
        let reflection_decode = options
            .reflection_encoding
            .map_or("decodeGamma", |e| e.decode_func());

        let mut frontend_decl = String::from(ctx.chunk("litShaderArgsPS")?);
        frontend_decl.push('\n');
        frontend_decl.push_str(&frontend.declarations);

        table.insert("varyings", self.varying_declarations()?);
        table.insert("frontendDecl", frontend_decl);
        table.insert("frontendCode", frontend.code.as_str());
        table.insert("lightDeclarations", declarations);
        table.insert("lightEvaluations", evaluations);
        table.insert("lightFunctions", functions);
        table.insert("clusteredLighting", clustered);
        table.insert("lightingUv", lighting_uv);
        table.insert("ambientDecode", ambient_decode);
        table.insert("reflectionDecode", reflection_decode);

        self.fragment_code = render(ctx.chunk("litMainPS")?, &table);
        Ok(())
    }

    fn add_forward_defines(&mut self) {
        let options = self.options;
        let needs_normal = options.needs_normal();
        let tangents = self.vertex_defines.contains("TANGENTS");
        let defines = &mut self.fragment_defines;

        defines.set_if(needs_normal, "LIT_NEEDS_NORMAL");
        defines.set_if(
            needs_normal
                && (options.use_normals || options.use_clear_coat_normals || options.use_heights),
            "LIT_TBN",
        );
        defines.set_if(tangents, "LIT_TANGENTS");
        defines.set_if(options.lighting(), "LIT_LIGHTING");
        defines.set_if(
            !(options.lightmap && options.lightmap_without_ambient),
            "LIT_ADD_AMBIENT",
        );
        defines.set_if(options.reflections(), "LIT_REFLECTIONS");
        defines.set_if(options.lightmap, "LIT_LIGHTMAP");
        defines.set_if(options.dir_lightmap, "LIT_DIR_LIGHTMAP");
        defines.set_if(options.use_ao, "LIT_AO");
        defines.set_if(options.use_specular, "LIT_SPECULAR");
        defines.set_if(options.use_specular_color, "LIT_SPECULAR_COLOR");
        defines.set_if(options.use_metalness, "LIT_METALNESS");
        defines.set_if(options.use_specularity_factor, "LIT_SPECULARITY_FACTOR");
        defines.set_if(options.use_sheen, "LIT_SHEEN");
        defines.set_if(options.use_clear_coat, "LIT_CLEARCOAT");
        defines.set_if(options.use_iridescence, "LIT_IRIDESCENCE");
        defines.set_if(options.use_refraction, "LIT_REFRACTION");
        defines.set_if(options.enable_ggx_specular, "LIT_GGX_SPECULAR");
        defines.set_if(options.two_sided_lighting, "LIT_TWO_SIDED_LIGHTING");
        defines.set_if(options.occlude_direct, "LIT_OCCLUDE_DIRECT");
        defines.set_if(options.cubemap_rotation, "LIT_CUBEMAP_ROTATION");
        defines.set_if(options.alpha_to_coverage, "LIT_ALPHA_TO_COVERAGE");

        defines.set("LIT_BLEND_TYPE", options.blend_type.name());
        defines.set("LIT_FRESNEL_MODEL", options.fresnel_model.name());
        defines.set("LIT_AMBIENT_SOURCE", options.ambient_source.name());
        defines.set("LIT_REFLECTION_SOURCE", options.reflection_source.name());
        defines.set("LIT_CUBEMAP_PROJECTION", options.cubemap_projection.name());
        defines.set("LIT_OCCLUDE_SPECULAR", options.occlude_specular.name());
        defines.set("LIT_NINESLICED_MODE", options.nine_sliced_mode.name());
    }

    /// Per-light defines and table entries. Returns the explicit light count.
    fn add_light_defines(&mut self, table: &mut SubstitutionTable) -> usize {
        let options = self.options;
        let defines = &mut self.fragment_defines;
        let mut shadow_directional = false;
        let mut area_lights = options.clustered_lighting && options.clustered_area_lights;
        let mut count = 0;

        for (i, light) in options.explicit_lights().enumerate() {
            count += 1;
            defines.set_flag(&format!("LIGHT{i}"));

            table.insert(format!("LIGHT{i}TYPE"), light.light_type.name());
            table.insert(format!("LIGHT{i}SHAPE"), light.shape.name());
            table.insert(format!("LIGHT{i}FALLOFF"), light.falloff.name());
            table.insert(format!("LIGHT{i}SHADOWTYPE"), light.shadow_type.name());
            table.insert(
                format!("LIGHT{i}COOKIE_CHANNEL"),
                light.cookie.map_or("r", |c| c.channel.swizzle()),
            );

            if light.cast_shadows {
                defines.set_flag(&format!("LIGHT{i}CASTSHADOW"));
                defines.set_if(light.shadow_type.is_pcf(), &format!("LIGHT{i}SHADOW_PCF"));
                defines.set_if(
                    light.normal_offset_bias,
                    &format!("LIGHT{i}_SHADOW_SAMPLE_NORMAL_OFFSET"),
                );
                defines.set_flag(&format!("SHADOW_KIND_{}", light.shadow_type.kind()));
                if light.light_type == LightType::Directional {
                    defines.set(
                        &format!("LIGHT{i}_SHADOW_CASCADES"),
                        &light.cascades().to_string(),
                    );
                    shadow_directional = true;
                }
            }

            if let Some(cookie) = light.cookie {
                defines.set_flag(&format!("LIGHT{i}COOKIE"));
                defines.set_if(cookie.cubemap, &format!("LIGHT{i}COOKIE_CUBEMAP"));
                defines.set_if(cookie.falloff, &format!("LIGHT{i}COOKIE_FALLOFF"));
                defines.set_if(cookie.transform, &format!("LIGHT{i}COOKIE_TRANSFORM"));
            }

            defines.set_if(
                light.affect_specularity && options.use_specular,
                &format!("LIGHT{i}AFFECT_SPECULARITY"),
            );
            area_lights |= light.is_area();
        }

        defines.set_if(shadow_directional, "SHADOW_DIRECTIONAL");
        defines.set_if(area_lights, "AREA_LIGHTS");
        defines.set("LIGHT_COUNT", &count.to_string());
        count
    }

    /// Clustered lighting defines. Returns whether clustered code is emitted.
    fn add_clustered_defines(&mut self) -> bool {
        let options = self.options;
        if !options.clustered_lighting {
            return false;
        }
        let defines = &mut self.fragment_defines;
        defines.set_flag("LIT_CLUSTERED_LIGHTS");
        defines.set_if(options.clustered_cookies, "CLUSTER_COOKIES");
        defines.set_if(options.clustered_area_lights, "CLUSTER_AREALIGHTS");
        defines.set_if(options.light_mask_dynamic, "CLUSTER_MESH_DYNAMIC_LIGHTS");
        if options.clustered_shadows {
            let shadow_type = options.clustered_shadow_type;
            defines.set_flag("CLUSTER_SHADOWS");
            defines.set_flag(&format!("CLUSTER_SHADOW_TYPE_{}", shadow_type.name()));
            defines.set_flag(&format!("SHADOW_KIND_{}", shadow_type.kind()));
        }
        true
    }

    fn add_pass_defines(&mut self) {
        if let ShaderPass::Shadow {
            light_type,
            shadow_type,
        } = self.options.pass
        {
            let defines = &mut self.fragment_defines;
            defines.set_if(self.options.pass.perspective_depth(), "PERSPECTIVE_DEPTH");
            defines.set("LIGHT_TYPE", light_type.name());
            defines.set("SHADOW_TYPE", shadow_type.name());
        }
    }

    /// Packages both stages for the assembler.
    #[must_use]
    pub fn into_request(self, name: &str) -> AssembleRequest {
        let mut request = AssembleRequest::new(name, self.ctx.language);
        request.attributes = self.attributes;
        request.vertex = StageSource::new(self.vertex_code, self.vertex_defines);
        request.fragment = StageSource::new(self.fragment_code, self.fragment_defines);
        request.precision = self.ctx.precision;
        request
    }
}
