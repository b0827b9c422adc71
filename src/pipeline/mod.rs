//! Program Pipeline
//!
//! - [`cache`]: the per-device [`ProgramCache`] and generator registry

pub mod cache;

pub use cache::{
    CustomShaderDesc, ProgramCache, ProgramRecord, SKYBOX_GENERATOR, STANDARD_GENERATOR,
};
