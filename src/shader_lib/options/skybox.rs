//! Skybox Options

use serde::{Deserialize, Serialize};

use crate::resources::TextureEncoding;

/// Geometry the sky is projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyboxProjection {
    /// Infinitely distant cube.
    #[default]
    Infinite,
    /// World-space box mesh.
    Box,
    /// World-space dome mesh.
    Dome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyboxOptions {
    pub encoding: TextureEncoding,
    /// Sample a cubemap instead of the equirect environment atlas.
    pub use_cubemap: bool,
    /// Stretch cubemap texels to hide seams at low mips.
    pub fixed_seams: bool,
    pub mip: u32,
    pub projection: SkyboxProjection,
}
