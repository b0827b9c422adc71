//! Skybox Generator
//!
//! Renders the environment behind the scene, either from a cubemap or from
//! the equirect environment atlas, optionally projected onto a world-space
//! box or dome mesh.

use crate::errors::{Result, ShaderLibError};
use crate::resources::ShaderDefines;
use crate::shader_lib::assembler::{AssembleRequest, StageSource};
use crate::shader_lib::chunk_builder::ChunkBuilder;
use crate::shader_lib::definition::{Semantic, ShaderDefinition};
use crate::shader_lib::options::{ProgramOptions, SkyboxOptions, SkyboxProjection};
use crate::shader_lib::programs::{GenerationContext, ShaderGenerator, definition_name};
use crate::shader_lib::template::{SubstitutionTable, render};
use crate::utils::canonical_key_string;

#[derive(Debug, Default, Clone, Copy)]
pub struct SkyboxGenerator;

impl SkyboxGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn expect_skybox(options: &ProgramOptions) -> Result<&SkyboxOptions> {
    match options {
        ProgramOptions::Skybox(options) => Ok(options),
        _ => Err(ShaderLibError::OptionsMismatch {
            generator: "skybox".to_string(),
            expected: "skybox",
        }),
    }
}

fn skybox_defines(options: &SkyboxOptions) -> ShaderDefines {
    let mut defines = ShaderDefines::new();
    defines.set_if(options.use_cubemap, "SKY_CUBEMAP");
    if options.use_cubemap {
        defines.set_if(options.fixed_seams, "SKYBOX_FIXED_SEAMS");
        defines.set("SKYBOX_MIP", &options.mip.to_string());
    }
    match options.projection {
        SkyboxProjection::Infinite => {}
        SkyboxProjection::Box => {
            defines.set_flag("SKYMESH");
            defines.set_flag("SKYMESH_BOX");
        }
        SkyboxProjection::Dome => {
            defines.set_flag("SKYMESH");
            defines.set_flag("SKYMESH_DOME");
        }
    }
    defines
}

impl ShaderGenerator for SkyboxGenerator {
    fn key_string(&self, options: &ProgramOptions) -> Result<String> {
        canonical_key_string(expect_skybox(options)?)
    }

    fn create_shader_definition(
        &self,
        ctx: &GenerationContext<'_>,
        options: &ProgramOptions,
    ) -> Result<ShaderDefinition> {
        let skybox = expect_skybox(options)?;
        let defines = skybox_defines(skybox);

        let table = SubstitutionTable::new().with("SKYBOX_DECODE_FNC", skybox.encoding.decode_func());

        let mut fragment = ChunkBuilder::new();
        fragment.append(&[ctx.chunk("decodePS")?, &render(ctx.chunk("skyboxPS")?, &table)]);

        let mut request = AssembleRequest::new(&definition_name(ctx.generator_name, options), ctx.language);
        request.attributes.insert("aPosition".to_string(), Semantic::Position);
        request.vertex = StageSource::new(ctx.chunk("skyboxVS")?.to_string(), defines.clone());
        request.fragment = StageSource::new(fragment.into_code(), defines);
        request.precision = ctx.precision;

        ctx.assembler.assemble(ctx.device, ctx.chunks, request)
    }
}
