//! Standard Material Generator
//!
//! Physically based material frontend on top of the [`LitShader`] backend.
//!
//! # Frontend order
//!
//! Forward passes emit the surface sections in a fixed order, since later
//! sections read the outputs of earlier ones (`dUvOffset`, `dNormalW`, ...):
//!
//! parallax → opacity → normal → albedo → refraction → iridescence →
//! specular (sheen, metalness, specularity factor, specular, gloss) → AO →
//! emission → clear coat → lightmap
//!
//! Other passes only evaluate opacity, alpha test and dithering.
//!
//! # Map instantiation
//!
//! Every map chunk is rendered with its own substitution table (`$UV`, `$CH`,
//! `$SAMPLER`, `$SAMPLER_STATE`, `$DECODE`, `$VC`, `$DETAILMODE`) and prefixed
//! with `#define`/`#undef` lines for `MAPFLOAT`, `MAPCOLOR`, `MAPVERTEX`,
//! `MAPTEXTURE` and `MAPINVERT`, so no map state leaks into the next chunk.

use std::fmt::Write as _;
use std::sync::LazyLock;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::errors::{Result, ShaderLibError};
use crate::resources::{MapTint, ShaderLanguage, TextureMapOptions};
use crate::shader_lib::chunk_builder::ChunkBuilder;
use crate::shader_lib::definition::{ShaderDefinition, glsl_to_wgsl_type};
use crate::shader_lib::options::{
    DitherMode, NineSlicedMode, ProgramOptions, StandardMaterialOptions, analyze_uv_usage,
};
use crate::shader_lib::programs::lit_shader::{FrontendCode, LitShader};
use crate::shader_lib::programs::{GenerationContext, ShaderGenerator, definition_name};
use crate::shader_lib::template::{SubstitutionTable, render};
use crate::utils::canonical_value_string;

static EMPTY_MAP: LazyLock<TextureMapOptions> = LazyLock::new(TextureMapOptions::default);

/// Generator of the standard material family.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardGenerator;

impl StandardGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn expect_standard(options: &ProgramOptions) -> Result<&StandardMaterialOptions> {
    match options {
        ProgramOptions::Standard(options) => Ok(options),
        _ => Err(ShaderLibError::OptionsMismatch {
            generator: "standard".to_string(),
            expected: "standard",
        }),
    }
}

impl ShaderGenerator for StandardGenerator {
    /// The light list is replaced by the packed keys of the explicit lights:
    /// with clustered lighting only directional lights reach the key, the
    /// others are resolved by the cluster lookup and never change the code.
    fn key_string(&self, options: &ProgramOptions) -> Result<String> {
        let options = expect_standard(options)?;

        let mut value = serde_json::to_value(options)?;
        if let Some(lit) = value.get_mut("lit").and_then(Value::as_object_mut) {
            lit.remove("lights");
        }
        let mut key = canonical_value_string(&value);

        let lights: Vec<String> = options
            .lit
            .explicit_lights()
            .map(|light| light.key().to_string())
            .collect();
        key.push_str("\nlights:");
        key.push_str(&lights.join(","));
        Ok(key)
    }

    fn create_shader_definition(
        &self,
        ctx: &GenerationContext<'_>,
        options: &ProgramOptions,
    ) -> Result<ShaderDefinition> {
        let standard = expect_standard(options)?;
        if !standard.prepared {
            return Err(ShaderLibError::MissingOption(
                "sampler groups (build standard options with prepare_standard)".to_string(),
            ));
        }

        let mut frontend = StandardFrontend::new(ctx, standard);
        frontend.generate()?;
        let uv = analyze_uv_usage(frontend.used_maps.iter().copied());
        let code = frontend.finish();

        let mut lit = LitShader::new(ctx, &standard.lit);
        lit.generate_vertex(&uv)?;
        lit.generate_fragment(&code)?;

        let request = lit.into_request(&definition_name(ctx.generator_name, options));
        ctx.assembler.assemble(ctx.device, ctx.chunks, request)
    }
}

/// Emits the standard surface code for one option record.
struct StandardFrontend<'a> {
    ctx: &'a GenerationContext<'a>,
    options: &'a StandardMaterialOptions,
    declarations: ChunkBuilder,
    code: ChunkBuilder,
    /// Statements of `evaluateFrontend`.
    body: ChunkBuilder,
    /// Maps whose chunk samples them, in emission order.
    used_maps: Vec<&'a TextureMapOptions>,
    /// Sampler name of each sampler group: the first map of the group.
    sampler_names: FxHashMap<u32, String>,
    declared_samplers: Vec<u32>,
}

impl<'a> StandardFrontend<'a> {
    fn new(ctx: &'a GenerationContext<'a>, options: &'a StandardMaterialOptions) -> Self {
        let mut sampler_names = FxHashMap::default();
        for map in options.maps.iter().filter(|m| m.enabled) {
            sampler_names
                .entry(map.sampler_group)
                .or_insert_with(|| format!("texture_{}Map", map.base_name));
        }

        Self {
            ctx,
            options,
            declarations: ChunkBuilder::new(),
            code: ChunkBuilder::new(),
            body: ChunkBuilder::new(),
            used_maps: Vec::new(),
            sampler_names,
            declared_samplers: Vec::new(),
        }
    }

    fn language(&self) -> ShaderLanguage {
        self.ctx.language
    }

    fn vec3(&self, value: &str) -> String {
        match self.language() {
            ShaderLanguage::Glsl => format!("vec3({value})"),
            ShaderLanguage::Wgsl => format!("vec3f({value})"),
        }
    }

    /// Declares a private global of GLSL type `ty`.
    fn global(&mut self, name: &str, ty: &str) -> Result<()> {
        let line = match self.language() {
            ShaderLanguage::Glsl => format!("{ty} {name};"),
            ShaderLanguage::Wgsl => {
                let wgsl = glsl_to_wgsl_type(ty)
                    .ok_or_else(|| ShaderLibError::InvalidOption(format!("global type '{ty}'")))?;
                format!("var<private> {name}: {wgsl};")
            }
        };
        self.declarations.append(&[&line]);
        Ok(())
    }

    fn statement(&mut self, statement: &str) {
        self.body.append(&[&format!("    {statement};")]);
    }

    fn call(&mut self, function: &str) {
        self.statement(&format!("{function}()"));
    }

    fn assign(&mut self, target: &str, value: &str) {
        self.statement(&format!("{target} = {value}"));
    }

    fn add_chunk(&mut self, name: &str) -> Result<()> {
        let template = self.ctx.chunk(name)?;
        self.code.append(&[template]);
        Ok(())
    }

    /// Options of slot `base_name`; a disabled map when the record lacks it.
    fn map(&self, base_name: &str) -> &'a TextureMapOptions {
        self.options.map(base_name).unwrap_or(&*EMPTY_MAP)
    }

    fn generate(&mut self) -> Result<()> {
        self.declarations.append(&[match self.language() {
            ShaderLanguage::Glsl => "uniform float textureBias;",
            ShaderLanguage::Wgsl => "uniform textureBias: f32;",
        }]);

        if self.options.lit.pass.is_forward() {
            self.generate_forward()
        } else {
            self.generate_opacity_only()
        }
    }

    fn generate_opacity_only(&mut self) -> Result<()> {
        if self.options.lit.needs_opacity() {
            self.add_opacity()?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn generate_forward(&mut self) -> Result<()> {
        let options = self.options;
        let lit = &options.lit;
        self.add_chunk("decodePS")?;

        if lit.nine_sliced_mode != NineSlicedMode::None {
            self.declarations.append(&["#define nineSlicedUv vTiledUv"]);
        }

        // parallax
        if lit.use_heights {
            self.global("dUvOffset", "vec2")?;
            self.add_map("height", "parallaxPS")?;
            self.call("getParallax");
        }

        // opacity
        if lit.needs_opacity() {
            self.add_opacity()?;
        } else {
            self.assign("litArgs_opacity", "1.0");
        }

        // normal
        let normal_texture = self.map("normal").enabled;
        let clear_coat_normal_texture =
            lit.use_clear_coat && self.map("clearCoatNormal").enabled;
        if normal_texture || clear_coat_normal_texture {
            self.add_chunk(options.normal_format.chunk())?;
        }
        self.global("dVertexNormalW", "vec3")?;
        if lit.needs_normal() {
            self.global("dNormalW", "vec3")?;
            self.assign("dVertexNormalW", "normalize(vNormalW)");
            if normal_texture {
                self.add_map("normalDetail", "normalDetailMapPS")?;
            }
            self.add_map("normal", "normalMapPS")?;
            self.call("getNormal");
            self.assign("litArgs_worldNormal", "dNormalW");
        }

        // albedo
        if self.map("diffuseDetail").enabled || self.map("aoDetail").enabled {
            self.add_chunk("detailModesPS")?;
        }
        self.global("dAlbedo", "vec3")?;
        if self.map("diffuse").enabled {
            self.add_map("diffuseDetail", "diffuseDetailMapPS")?;
        }
        self.add_map("diffuse", "diffusePS")?;
        self.call("getAlbedo");
        self.assign("litArgs_albedo", "dAlbedo");

        // refraction
        if lit.use_refraction {
            self.global("dTransmission", "float")?;
            self.global("dThickness", "float")?;
            self.add_map("refraction", "transmissionPS")?;
            self.add_map("thickness", "thicknessPS")?;
            self.call("getRefraction");
            self.call("getThickness");
            self.assign("litArgs_transmission", "dTransmission");
            self.assign("litArgs_thickness", "dThickness");
        }

        // iridescence
        if lit.use_iridescence {
            self.global("dIridescence", "float")?;
            self.global("dIridescenceThickness", "float")?;
            self.add_map("iridescence", "iridescencePS")?;
            self.add_map("iridescenceThickness", "iridescenceThicknessPS")?;
            self.call("getIridescence");
            self.call("getIridescenceThickness");
            self.assign("litArgs_iridescence_intensity", "dIridescence");
            self.assign("litArgs_iridescence_thickness", "dIridescenceThickness");
        }

        // specularity & glossiness
        if lit.use_specular {
            if lit.use_sheen {
                self.global("sSpecularity", "vec3")?;
                self.global("sGlossiness", "float")?;
                self.add_map("sheen", "sheenPS")?;
                self.add_map("sheenGloss", "sheenGlossPS")?;
                self.call("getSheen");
                self.call("getSheenGlossiness");
                self.assign("litArgs_sheen_specularity", "sSpecularity");
                self.assign("litArgs_sheen_gloss", "sGlossiness");
            }
            if lit.use_metalness {
                self.global("dMetalness", "float")?;
                self.global("dIor", "float")?;
                self.add_map("metalness", "metalnessPS")?;
                self.add_map_without_texture("iorPS")?;
                self.call("getMetalness");
                self.call("getIor");
                self.assign("litArgs_metalness", "dMetalness");
                self.assign("litArgs_ior", "dIor");
            }
            if lit.use_specularity_factor {
                self.global("dSpecularityFactor", "float")?;
                self.add_map("specularityFactor", "specularityFactorPS")?;
                self.call("getSpecularityFactor");
                self.assign("litArgs_specularityFactor", "dSpecularityFactor");
            }
            self.global("dSpecularity", "vec3")?;
            if lit.use_specular_color {
                self.add_map("specular", "specularPS")?;
                self.call("getSpecularity");
            } else {
                let white = self.vec3("1.0");
                self.assign("dSpecularity", &white);
            }
            self.global("dGlossiness", "float")?;
            self.add_map("gloss", "glossPS")?;
            self.call("getGlossiness");
            self.assign("litArgs_specularity", "dSpecularity");
            self.assign("litArgs_gloss", "dGlossiness");
        }

        // ambient occlusion
        if lit.use_ao {
            self.global("dAo", "float")?;
            if self.map("ao").enabled {
                self.add_map("aoDetail", "aoDetailMapPS")?;
            }
            self.add_map("ao", "aoPS")?;
            self.call("getAO");
            self.assign("litArgs_ao", "dAo");
        }

        // emission
        self.global("dEmission", "vec3")?;
        self.add_map("emissive", "emissivePS")?;
        self.call("getEmission");
        self.assign("litArgs_emission", "dEmission");

        // clear coat
        if lit.use_clear_coat {
            self.global("ccSpecularity", "float")?;
            self.global("ccGlossiness", "float")?;
            self.global("ccNormalW", "vec3")?;
            self.add_map("clearCoat", "clearCoatPS")?;
            self.add_map("clearCoatGloss", "clearCoatGlossPS")?;
            self.add_map("clearCoatNormal", "clearCoatNormalPS")?;
            self.call("getClearCoat");
            self.call("getClearCoatGlossiness");
            self.call("getClearCoatNormal");
            self.assign("litArgs_clearcoat_specularity", "ccSpecularity");
            self.assign("litArgs_clearcoat_gloss", "ccGlossiness");
            self.assign("litArgs_clearcoat_worldNormal", "ccNormalW");
        }

        // lightmap
        if lit.lightmap {
            self.global("dLightmap", "vec3")?;
            if lit.dir_lightmap {
                self.global("dLightmapDir", "vec3")?;
                self.add_map("light", "lightmapDirPS")?;
                self.call("getLightMap");
                self.assign("litArgs_lightmapDir", "dLightmapDir");
            } else {
                self.add_map("light", "lightmapSinglePS")?;
                self.call("getLightMap");
            }
            self.assign("litArgs_lightmap", "dLightmap");
        }

        Ok(())
    }

    fn add_opacity(&mut self) -> Result<()> {
        let options = self.options;
        let lit = &options.lit;
        self.global("dAlpha", "float")?;
        self.add_map("opacity", "opacityPS")?;
        self.call("getOpacity");

        if lit.alpha_test {
            self.add_chunk("alphaTestPS")?;
            self.statement("alphaTest(dAlpha)");
        }

        match lit.active_dither() {
            DitherMode::None => {}
            dither => {
                if dither == DitherMode::Bayer8 {
                    self.add_chunk("bayerPS")?;
                }
                self.add_chunk("opacityDitherPS")?;
                self.statement("opacityDither(dAlpha, 0.0)");
            }
        }

        self.assign("litArgs_opacity", "dAlpha");
        Ok(())
    }

    /// Samples no texture; the chunk only reads material constants.
    fn add_map_without_texture(&mut self, chunk: &str) -> Result<()> {
        let map = TextureMapOptions {
            tint: MapTint::FLOAT,
            ..TextureMapOptions::default()
        };
        let rendered = self.render_map(&map, chunk)?;
        self.code.append(&[&rendered]);
        Ok(())
    }

    /// Instantiates map chunk `chunk` for slot `base_name`.
    fn add_map(&mut self, base_name: &str, chunk: &str) -> Result<()> {
        let map = self.map(base_name);
        if map.enabled {
            self.used_maps.push(map);
            self.declare_sampler(map);
        }
        let rendered = self.render_map(map, chunk)?;
        self.code.append(&[&rendered]);
        Ok(())
    }

    fn render_map(&self, map: &TextureMapOptions, chunk: &str) -> Result<String> {
        let mut code = String::new();
        let flags = [
            ("MAPFLOAT", map.tint.contains(MapTint::FLOAT)),
            ("MAPCOLOR", map.tint.contains(MapTint::COLOR)),
            ("MAPVERTEX", map.vertex_color && self.options.lit.vertex_colors),
            ("MAPTEXTURE", map.enabled),
            ("MAPINVERT", map.invert),
        ];
        for (name, set) in flags {
            let directive = if set { "#define" } else { "#undef" };
            let _ = writeln!(code, "{directive} {name}");
        }

        let sampler = self.sampler_name(map);
        let decode = if map.channel == "aaa" {
            "passThrough"
        } else {
            map.encoding.map_or("decodeGamma", |e| e.decode_func())
        };

        let mut table = SubstitutionTable::new();
        table.insert("UV", self.uv_expression(map));
        table.insert("CH", map.channel.as_str());
        table.insert("VC", map.vertex_color_channel.as_str());
        table.insert("SAMPLER_STATE", format!("{sampler}Sampler"));
        table.insert("SAMPLER", sampler);
        table.insert("DECODE", decode);
        table.insert("DETAILMODE", map.detail_mode.map_or("mul", |m| m.name()));

        code.push_str(&render(self.ctx.chunk(chunk)?, &table));
        Ok(code)
    }

    fn sampler_name(&self, map: &TextureMapOptions) -> String {
        self.sampler_names
            .get(&map.sampler_group)
            .filter(|_| map.enabled)
            .cloned()
            .unwrap_or_else(|| format!("texture_{}Map", map.base_name))
    }

    fn declare_sampler(&mut self, map: &TextureMapOptions) {
        if self.declared_samplers.contains(&map.sampler_group) {
            return;
        }
        self.declared_samplers.push(map.sampler_group);
        let sampler = self.sampler_name(map);
        let declaration = match self.language() {
            ShaderLanguage::Glsl => format!("uniform sampler2D {sampler};"),
            ShaderLanguage::Wgsl => {
                format!("var {sampler}: texture_2d<f32>;\nvar {sampler}Sampler: sampler;")
            }
        };
        self.declarations.append(&[&declaration]);
    }

    fn uv_expression(&self, map: &TextureMapOptions) -> String {
        let lit = &self.options.lit;
        let forward = lit.pass.is_forward();
        let base = if forward && lit.nine_sliced_mode != NineSlicedMode::None {
            "nineSlicedUv".to_string()
        } else if map.transform_id == 0 {
            format!("vUv{}", map.uv)
        } else {
            format!("vUV{}_{}", map.uv, map.transform_id)
        };

        if forward && lit.use_heights && map.base_name != "height" {
            format!("{base} + dUvOffset")
        } else {
            base
        }
    }

    fn finish(self) -> FrontendCode {
        let lighting_uv = self
            .options
            .map("normal")
            .filter(|m| m.enabled)
            .map(|m| self.uv_expression(m));

        let mut code = self.code;
        let header = match self.ctx.language {
            ShaderLanguage::Glsl => "void evaluateFrontend() {",
            ShaderLanguage::Wgsl => "fn evaluateFrontend() {",
        };
        code.append(&[header, self.body.code(), "}"]);

        FrontendCode {
            declarations: self.declarations.into_code(),
            code: code.into_code(),
            lighting_uv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{DeviceCapabilities, LightDescriptor, TextureEncoding};
    use crate::shader_lib::assembler::ShaderAssembler;
    use crate::shader_lib::chunks::ChunkLibrary;
    use crate::shader_lib::options::{ShaderPass, prepare_standard};
    use crate::shader_lib::template::unresolved_placeholders;
    use crate::utils::KeyWidth;

    fn generate(options: &StandardMaterialOptions, language: ShaderLanguage) -> ShaderDefinition {
        let device = DeviceCapabilities::modern();
        let chunks = ChunkLibrary::builtin().unwrap();
        let assembler = ShaderAssembler::new().unwrap();
        let ctx = GenerationContext {
            device: &device,
            chunks: &chunks,
            assembler: &assembler,
            language,
            precision: None,
            generator_name: "standard",
        };
        StandardGenerator
            .create_shader_definition(&ctx, &options.clone().into())
            .unwrap()
    }

    #[test]
    fn test_shared_sampler_declared_once() {
        let raw = StandardMaterialOptions::new()
            .with_map(TextureMapOptions::new("diffuse").with_texture(3))
            .with_map(TextureMapOptions::new("emissive").with_texture(3));
        let options = prepare_standard(&raw, &[], ShaderPass::Forward);
        let definition = generate(&options, ShaderLanguage::Glsl);
        let fragment = &definition.fragment.code;

        assert_eq!(fragment.matches("uniform sampler2D texture_diffuseMap;").count(), 1);
        assert!(!fragment.contains("texture_emissiveMap"));
        assert!(fragment.contains("decodeGamma(texture2DBias(texture_diffuseMap, vUv0, textureBias)).rgb"));
        assert!(unresolved_placeholders(fragment).is_empty());
    }

    #[test]
    fn test_map_decode_and_flags() {
        let raw = StandardMaterialOptions::new().with_map(
            TextureMapOptions::new("diffuse")
                .with_texture(1)
                .with_encoding(TextureEncoding::Srgb)
                .with_tint(MapTint::COLOR),
        );
        let options = prepare_standard(&raw, &[], ShaderPass::Forward);
        let fragment = generate(&options, ShaderLanguage::Glsl).fragment.code;

        assert!(fragment.contains("#define MAPTEXTURE"));
        assert!(fragment.contains("#define MAPCOLOR"));
        assert!(fragment.contains("decodeGamma(texture2DBias(texture_diffuseMap"));
        assert!(!fragment.contains('$'));
    }

    #[test]
    fn test_wgsl_sampler_state() {
        let raw = StandardMaterialOptions::new()
            .with_map(TextureMapOptions::new("opacity").with_texture(9));
        let mut options = prepare_standard(&raw, &[], ShaderPass::Forward);
        options.lit.alpha_test = true;
        let fragment = generate(&options, ShaderLanguage::Wgsl).fragment.code;

        assert!(fragment.contains("var texture_opacityMap: texture_2d<f32>;"));
        assert!(fragment.contains(
            "textureSampleBias(texture_opacityMap, texture_opacityMapSampler, vUv0, uniform.textureBias).a"
        ));
        assert!(fragment.contains("fn evaluateFrontend() {"));
        assert!(fragment.contains("alphaTest(dAlpha);"));
    }

    #[test]
    fn test_depth_pass_emits_opacity_only() {
        let mut raw = StandardMaterialOptions::new()
            .with_map(TextureMapOptions::new("diffuse").with_texture(1))
            .with_map(TextureMapOptions::new("opacity").with_texture(2));
        raw.lit.alpha_test = true;
        let options = prepare_standard(&raw, &[], ShaderPass::Depth);
        let fragment = generate(&options, ShaderLanguage::Glsl).fragment.code;

        assert!(fragment.contains("void getOpacity()"));
        assert!(!fragment.contains("getAlbedo"));
        assert!(fragment.contains("#define DEPTH_PASS"));
        assert!(fragment.contains("#define SHADER_NAME standard-pass:depth"));
    }

    #[test]
    fn test_parallax_offsets_other_maps() {
        let raw = StandardMaterialOptions::new()
            .with_map(TextureMapOptions::new("height").with_texture(1))
            .with_map(TextureMapOptions::new("diffuse").with_texture(2).with_uv(1));
        let options = prepare_standard(&raw, &[], ShaderPass::Forward);
        let fragment = generate(&options, ShaderLanguage::Glsl).fragment.code;

        assert!(fragment.contains("texture2DBias(texture_heightMap, vUv0, textureBias).g"));
        assert!(fragment.contains("texture2DBias(texture_diffuseMap, vUv1 + dUvOffset, textureBias)"));
        assert!(fragment.contains("#define LIT_TBN"));
    }

    #[test]
    fn test_key_ignores_clustered_omni_lights() {
        let mut a = StandardMaterialOptions::new();
        a.lit.clustered_lighting = true;
        a.lit.lights = vec![LightDescriptor::directional()];
        let mut b = a.clone();
        b.lit.lights.push(LightDescriptor::omni());

        let ka = StandardGenerator.generate_key(&a.clone().into(), KeyWidth::Narrow);
        let kb = StandardGenerator.generate_key(&b.into(), KeyWidth::Narrow);
        assert_eq!(ka.unwrap(), kb.unwrap());

        let mut c = a;
        c.lit.clustered_lighting = false;
        c.lit.lights.push(LightDescriptor::omni());
        let kc = StandardGenerator
            .generate_key(&c.into(), KeyWidth::Narrow)
            .unwrap();
        let mut d = StandardMaterialOptions::new();
        d.lit.lights = vec![LightDescriptor::directional(), LightDescriptor::spot()];
        let kd = StandardGenerator
            .generate_key(&d.into(), KeyWidth::Narrow)
            .unwrap();
        assert_ne!(kc, kd);
    }

    #[test]
    fn test_unprepared_options_are_rejected() {
        let raw = StandardMaterialOptions::new()
            .with_map(TextureMapOptions::new("diffuse").with_texture(1))
            .with_map(TextureMapOptions::new("emissive").with_texture(2));
        let device = DeviceCapabilities::modern();
        let chunks = ChunkLibrary::builtin().unwrap();
        let assembler = ShaderAssembler::new().unwrap();
        let ctx = GenerationContext {
            device: &device,
            chunks: &chunks,
            assembler: &assembler,
            language: ShaderLanguage::Glsl,
            precision: None,
            generator_name: "standard",
        };

        let err = StandardGenerator
            .create_shader_definition(&ctx, &raw.clone().into())
            .unwrap_err();
        assert!(matches!(err, ShaderLibError::MissingOption(_)));

        let options = prepare_standard(&raw, &[], ShaderPass::Forward);
        let fragment = generate(&options, ShaderLanguage::Glsl).fragment.code;
        assert!(fragment.contains("uniform sampler2D texture_diffuseMap;"));
        assert!(fragment.contains("uniform sampler2D texture_emissiveMap;"));
        assert!(fragment.contains("texture2DBias(texture_emissiveMap"));
    }

    #[test]
    fn test_wrong_family_is_rejected() {
        let err = StandardGenerator
            .key_string(&ProgramOptions::Empty)
            .unwrap_err();
        assert!(matches!(err, ShaderLibError::OptionsMismatch { .. }));
    }
}
