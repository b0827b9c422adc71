//! Shader Definition Assembler
//!
//! Turns generator output into a complete [`ShaderDefinition`]. Each stage is
//! concatenated in a fixed order:
//!
//! | Section | Source |
//! |---------|--------|
//! | preamble | `templates/preamble.jinja`: version, output attachments, intro chunk, precision |
//! | shared | the `shared` chunk |
//! | defines | device-capability defines, then stage defines |
//! | marker | `#define SHADER_NAME <name>` |
//! | body | generator code |
//!
//! The preamble is rendered with minijinja using the engine's shader template
//! syntax (`{$ $}` blocks, `{{ }}` variables, `$$` line statements).

use std::collections::BTreeMap;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::errors::{Result, ShaderLibError};
use crate::resources::{DeviceCapabilities, Precision, ShaderDefines, ShaderLanguage};
use crate::shader_lib::chunk_builder::ChunkBuilder;
use crate::shader_lib::chunks::ChunkLibrary;
use crate::shader_lib::definition::{
    DefinitionMetadata, Semantic, ShaderDefinition, ShaderStage, glsl_to_wgsl_type,
};

const PREAMBLE_TEMPLATE: &str = include_str!("templates/preamble.jinja");

/// Fragment output type used for attachments the request does not name.
pub const DEFAULT_OUTPUT_TYPE: &str = "vec4";

const GLSL_VERSION_MODERN: &str = "#version 450";
const GLSL_VERSION_COMPAT: &str = "#version 300 es";

/// Value and sampler kinds receiving a default precision statement.
const PRECISION_KINDS: &[&str] = &[
    "float",
    "int",
    "usampler2D",
    "isampler2D",
    "sampler2DShadow",
    "samplerCubeShadow",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageKind {
    Vertex,
    Fragment,
}

/// Generator output for one stage, before assembly.
#[derive(Debug, Clone, Default)]
pub struct StageSource {
    pub code: String,
    pub includes: BTreeMap<String, String>,
    pub defines: ShaderDefines,
}

impl StageSource {
    #[must_use]
    pub fn new(code: String, defines: ShaderDefines) -> Self {
        Self {
            code,
            includes: BTreeMap::new(),
            defines,
        }
    }
}

/// Everything the assembler needs to build one definition.
#[derive(Debug, Clone)]
pub struct AssembleRequest {
    pub name: String,
    pub language: ShaderLanguage,
    pub attributes: BTreeMap<String, Semantic>,
    pub vertex: StageSource,
    pub fragment: StageSource,
    /// Caller defines applied to both stages. Override generator defines.
    pub defines: ShaderDefines,
    /// GLSL type of each fragment output, by attachment index.
    pub fragment_output_types: Vec<String>,
    /// Requested precision; the device maximum applies when lower.
    pub precision: Option<Precision>,
}

impl AssembleRequest {
    #[must_use]
    pub fn new(name: &str, language: ShaderLanguage) -> Self {
        Self {
            name: name.to_string(),
            language,
            attributes: BTreeMap::new(),
            vertex: StageSource::default(),
            fragment: StageSource::default(),
            defines: ShaderDefines::new(),
            fragment_output_types: Vec::new(),
            precision: None,
        }
    }
}

#[derive(Serialize)]
struct OutputAttachment {
    index: u32,
    ty: String,
}

/// Builds [`ShaderDefinition`]s from generator output.
pub struct ShaderAssembler {
    env: Environment<'static>,
    debug_print: bool,
}

impl std::fmt::Debug for ShaderAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderAssembler")
            .field("debug_print", &self.debug_print)
            .finish_non_exhaustive()
    }
}

impl ShaderAssembler {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();

        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()?;

        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        env.add_template("preamble", PREAMBLE_TEMPLATE)?;

        Ok(Self {
            env,
            debug_print: false,
        })
    }

    /// Logs every assembled stage at debug level.
    #[must_use]
    pub fn with_debug_print(mut self, enabled: bool) -> Self {
        self.debug_print = enabled;
        self
    }

    /// Assembles both stages of `request` for `device`.
    pub fn assemble(
        &self,
        device: &DeviceCapabilities,
        chunks: &ChunkLibrary,
        request: AssembleRequest,
    ) -> Result<ShaderDefinition> {
        let AssembleRequest {
            name,
            language,
            mut attributes,
            vertex,
            fragment,
            defines,
            fragment_output_types,
            precision,
        } = request;

        let precision = precision
            .unwrap_or_default()
            .resolve(device.max_precision);
        let outputs = output_attachments(device, language, &fragment_output_types)?;

        let vertex = self.assemble_stage(
            device,
            chunks,
            &name,
            language,
            StageKind::Vertex,
            vertex,
            &defines,
            &[],
            precision,
        )?;
        let fragment = self.assemble_stage(
            device,
            chunks,
            &name,
            language,
            StageKind::Fragment,
            fragment,
            &defines,
            &outputs,
            precision,
        )?;

        // Override chunks may pull in builtin attributes the generator never saw.
        for (attribute, semantic) in chunks.override_attributes(language) {
            attributes.entry(attribute.clone()).or_insert(*semantic);
        }

        let source_hash = ShaderDefinition::compute_source_hash(&vertex.code, &fragment.code);
        Ok(ShaderDefinition {
            name,
            shader_language: language,
            attributes,
            vertex,
            fragment,
            metadata: DefinitionMetadata {
                source_hash,
                ..DefinitionMetadata::default()
            },
        })
    }

    fn assemble_stage(
        &self,
        device: &DeviceCapabilities,
        chunks: &ChunkLibrary,
        name: &str,
        language: ShaderLanguage,
        stage: StageKind,
        source: StageSource,
        caller_defines: &ShaderDefines,
        outputs: &[OutputAttachment],
        precision: Precision,
    ) -> Result<ShaderStage> {
        let preamble = self.render_preamble(device, chunks, language, stage, outputs, precision)?;

        let stage_defines = source.defines.merged_with(caller_defines);
        let caps = device.caps_defines();
        let mut defines = caps.clone();
        for conflict in defines.merge_missing(&stage_defines) {
            log::warn!(
                "Shader '{name}': define {conflict} conflicts with a device capability define, keeping the device value"
            );
        }
        let mut stage_only = ShaderDefines::with_capacity(stage_defines.len());
        for (key, value) in stage_defines.iter() {
            if !caps.contains(key) {
                stage_only.set(key, value);
            }
        }

        let mut builder = ChunkBuilder::new();
        builder.append(&[
            &preamble,
            chunks.template(language, "shared")?,
            &caps.to_define_lines(),
            &stage_only.to_define_lines(),
            &format!("#define SHADER_NAME {name}"),
            &source.code,
        ]);
        let code = builder.into_code();

        if self.debug_print {
            debug_print_stage(name, stage, &code);
        }

        Ok(ShaderStage {
            code,
            includes: source.includes,
            defines,
        })
    }

    fn render_preamble(
        &self,
        device: &DeviceCapabilities,
        chunks: &ChunkLibrary,
        language: ShaderLanguage,
        stage: StageKind,
        outputs: &[OutputAttachment],
        precision: Precision,
    ) -> Result<String> {
        let (version, intro) = match (language, stage) {
            (ShaderLanguage::Wgsl, StageKind::Vertex) => (None, "wgslVS"),
            (ShaderLanguage::Wgsl, StageKind::Fragment) => (None, "wgslPS"),
            (ShaderLanguage::Glsl, StageKind::Vertex) if device.is_modern_backend => {
                (Some(GLSL_VERSION_MODERN), "webgpuVS")
            }
            (ShaderLanguage::Glsl, StageKind::Fragment) if device.is_modern_backend => {
                (Some(GLSL_VERSION_MODERN), "webgpuPS")
            }
            (ShaderLanguage::Glsl, StageKind::Vertex) => (Some(GLSL_VERSION_COMPAT), "gles3VS"),
            (ShaderLanguage::Glsl, StageKind::Fragment) => (Some(GLSL_VERSION_COMPAT), "gles3PS"),
        };

        let mut precision_kinds: Vec<&str> = Vec::new();
        if language == ShaderLanguage::Glsl {
            precision_kinds.extend_from_slice(PRECISION_KINDS);
            if device.supports_sampler_2d_array {
                precision_kinds.push("sampler2DArray");
            }
        }

        let outputs: &[OutputAttachment] = match stage {
            StageKind::Vertex => &[],
            StageKind::Fragment => outputs,
        };

        let template = self.env.get_template("preamble")?;
        let rendered = template.render(context! {
            version => version,
            language => language.as_str(),
            outputs => outputs,
            intro => chunks.template(language, intro)?,
            precision => precision.qualifier(),
            precision_kinds => precision_kinds,
        })?;
        Ok(rendered)
    }
}

fn output_attachments(
    device: &DeviceCapabilities,
    language: ShaderLanguage,
    types: &[String],
) -> Result<Vec<OutputAttachment>> {
    (0..device.max_color_attachments.max(1))
        .map(|index| {
            let glsl = types
                .get(index as usize)
                .map_or(DEFAULT_OUTPUT_TYPE, String::as_str);
            let wgsl = glsl_to_wgsl_type(glsl).ok_or_else(|| {
                ShaderLibError::InvalidOption(format!("fragment output type '{glsl}'"))
            })?;
            let ty = match language {
                ShaderLanguage::Glsl => glsl.to_string(),
                ShaderLanguage::Wgsl => wgsl.to_string(),
            };
            Ok(OutputAttachment { index, ty })
        })
        .collect()
}

fn debug_print_stage(name: &str, stage: StageKind, code: &str) {
    fn normalize_newlines(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        let mut last_was_newline = false;
        for c in s.chars() {
            if c == '\n' {
                if !last_was_newline {
                    result.push('\n');
                    last_was_newline = true;
                }
            } else {
                result.push(c);
                last_was_newline = false;
            }
        }
        result
    }

    log::debug!(
        "================= Generated {stage:?} Shader {name} ==================\n{}",
        normalize_newlines(code)
    );
}
