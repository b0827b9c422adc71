//! Shader Generators
//!
//! A generator owns one shading family. It has two entry points with very
//! different costs:
//!
//! - [`ShaderGenerator::generate_key`]: pure, no chunk lookups. Called on
//!   every request to probe the program cache.
//! - [`ShaderGenerator::create_shader_definition`]: only on a cache miss.
//!   Builds both stages from chunks and hands them to the assembler.
//!
//! Built-in generators:
//! - [`StandardGenerator`]: the standard physically based material
//! - [`SkyboxGenerator`]: environment background
//! - [`PassThroughGenerator`]: a prebuilt definition under a fixed key

pub mod lit_shader;
pub mod pass_through;
pub mod skybox;
pub mod standard;

use crate::errors::Result;
use crate::resources::{DeviceCapabilities, Precision, ShaderLanguage};
use crate::shader_lib::assembler::ShaderAssembler;
use crate::shader_lib::chunks::ChunkLibrary;
use crate::shader_lib::definition::ShaderDefinition;
use crate::shader_lib::options::ProgramOptions;
use crate::utils::{KeyWidth, VariantKey};

pub use lit_shader::{FrontendCode, LitShader};
pub use pass_through::PassThroughGenerator;
pub use skybox::SkyboxGenerator;
pub use standard::StandardGenerator;

/// Everything a generator reads besides its options.
///
/// Borrowed from the owning program cache for the duration of one
/// generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub device: &'a DeviceCapabilities,
    pub chunks: &'a ChunkLibrary,
    pub assembler: &'a ShaderAssembler,
    pub language: ShaderLanguage,
    pub precision: Option<Precision>,
    /// Name the generator is registered under.
    pub generator_name: &'a str,
}

impl GenerationContext<'_> {
    /// Template of chunk `name` in the target language.
    pub fn chunk(&self, name: &str) -> Result<&str> {
        self.chunks.template(self.language, name)
    }
}

/// A shading family.
pub trait ShaderGenerator: Send + Sync {
    /// Canonical key string of `options`. Must cover every field the generator
    /// branches on.
    fn key_string(&self, options: &ProgramOptions) -> Result<String>;

    /// Fingerprint of `options`.
    fn generate_key(&self, options: &ProgramOptions, width: KeyWidth) -> Result<VariantKey> {
        Ok(VariantKey::from_key_string(&self.key_string(options)?, width))
    }

    /// Builds the program variant for `options`.
    fn create_shader_definition(
        &self,
        ctx: &GenerationContext<'_>,
        options: &ProgramOptions,
    ) -> Result<ShaderDefinition>;
}

/// Name of a generated definition: the generator name, suffixed with the
/// render pass when the options carry one.
#[must_use]
pub fn definition_name(generator: &str, options: &ProgramOptions) -> String {
    match options.pass() {
        Some(pass) => format!("{generator}-pass:{pass}"),
        None => generator.to_string(),
    }
}
