//! Variant Option Model
//!
//! The option records that fully determine a generated program. Records are
//! plain serde data: the canonical key string of a record is its sorted
//! `path:value` flattening (see [`crate::utils::canonical_key_string`]).
//!
//! - [`LitShaderOptions`]: the lit backend (vertex inputs, lighting, blending)
//! - [`StandardMaterialOptions`]: the standard material frontend
//! - [`SkyboxOptions`]: the skybox generator
//! - [`builder`]: normalization of raw material options per pass

pub mod builder;
pub mod lit;
pub mod skybox;
pub mod standard;
pub mod uv;

use serde::{Deserialize, Serialize};

pub use builder::prepare_standard;
pub use lit::{
    AmbientSource, BlendType, CubemapProjection, DitherMode, FresnelModel, LitShaderOptions,
    NineSlicedMode, OccludeSpecular, ReflectionSource, ShaderPass,
};
pub use skybox::{SkyboxOptions, SkyboxProjection};
pub use standard::{NormalFormat, StandardMaterialOptions};
pub use uv::{MAX_UV_SETS, UvTransform, UvUsage, analyze_uv_usage};

/// The option record handed to a generator.
///
/// Each generator accepts one family and rejects the others with
/// [`ShaderLibError::InvalidOption`](crate::errors::ShaderLibError::InvalidOption).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ProgramOptions {
    Standard(StandardMaterialOptions),
    Skybox(SkyboxOptions),
    /// No options; used by generators with a single fixed variant.
    Empty,
}

impl ProgramOptions {
    #[must_use]
    pub const fn family(&self) -> &'static str {
        match self {
            ProgramOptions::Standard(_) => "standard",
            ProgramOptions::Skybox(_) => "skybox",
            ProgramOptions::Empty => "empty",
        }
    }

    /// Render pass the options were built for, when the family has passes.
    #[must_use]
    pub fn pass(&self) -> Option<ShaderPass> {
        match self {
            ProgramOptions::Standard(options) => Some(options.lit.pass),
            _ => None,
        }
    }
}

impl From<StandardMaterialOptions> for ProgramOptions {
    fn from(options: StandardMaterialOptions) -> Self {
        ProgramOptions::Standard(options)
    }
}

impl From<SkyboxOptions> for ProgramOptions {
    fn from(options: SkyboxOptions) -> Self {
        ProgramOptions::Skybox(options)
    }
}
