#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Myth ShaderLib
//!
//! Shader variant generation and program caching. A material describes
//! itself as an option record; a generator turns the record into complete
//! vertex and fragment sources; the [`ProgramCache`] generates each distinct
//! record at most once per device.
//!
//! ```rust,ignore
//! use myth_shaderlib::prelude::*;
//!
//! let cache = ProgramCache::with_builtin_chunks(
//!     DeviceCapabilities::modern(),
//!     ShaderLibSettings::default(),
//! )?;
//! let material = StandardMaterialOptions::new()
//!     .with_map(TextureMapOptions::new("diffuse").with_texture(7));
//! let options = prepare_standard(&material, &[LightDescriptor::directional()], ShaderPass::Forward);
//! let program = cache.get_or_create(STANDARD_GENERATOR, &options.into())?;
//! ```

pub mod errors;
pub mod pipeline;
pub mod resources;
pub mod settings;
pub mod shader_lib;
pub mod utils;

pub use errors::{Result, ShaderLibError};
pub use pipeline::{CustomShaderDesc, ProgramCache, ProgramRecord};
pub use resources::{DeviceCapabilities, LightDescriptor, ShaderDefines, TextureMapOptions};
pub use settings::ShaderLibSettings;
pub use shader_lib::{ShaderDefinition, ShaderGenerator};
pub use utils::{KeyWidth, VariantKey};

pub mod prelude {
    pub use crate::pipeline::{
        CustomShaderDesc, ProgramCache, ProgramRecord, SKYBOX_GENERATOR, STANDARD_GENERATOR,
    };
    pub use crate::resources::{
        DeviceCapabilities, LightDescriptor, LightType, ShaderLanguage, ShadowType,
        TextureEncoding, TextureMapOptions,
    };
    pub use crate::settings::ShaderLibSettings;
    pub use crate::shader_lib::options::{
        ProgramOptions, ShaderPass, SkyboxOptions, StandardMaterialOptions, prepare_standard,
    };
    pub use crate::shader_lib::{ShaderDefinition, ShaderGenerator};
    pub use crate::utils::KeyWidth;
}
