//! UV Usage Analysis
//!
//! Decides which texture-coordinate varyings a variant needs. Maps sampling a
//! UV set without a transform read the unmodified `vUv{set}` varying; maps
//! with a transform read a per-transform `vUV{set}_{id}` varying. Transforms
//! shared by several maps are emitted once.

use smallvec::SmallVec;

use crate::resources::TextureMapOptions;

/// Number of UV sets the vertex path supports.
pub const MAX_UV_SETS: usize = 2;

/// A texture-coordinate transform computed in the vertex stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UvTransform {
    pub id: u32,
    pub uv: u32,
    /// Uniform name prefix, taken from the first map using the transform.
    pub name: String,
}

impl UvTransform {
    /// Varying holding the transformed coordinates.
    #[must_use]
    pub fn varying(&self) -> String {
        format!("vUV{}_{}", self.uv, self.id)
    }
}

/// Which UV inputs and varyings a variant uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UvUsage {
    /// The vertex stage reads `vertex_texCoord{set}`.
    pub used_uv: [bool; MAX_UV_SETS],
    /// `vUv{set}` is passed through unmodified.
    pub used_unmodified_uv: [bool; MAX_UV_SETS],
    pub transforms: SmallVec<[UvTransform; 4]>,
}

impl UvUsage {
    /// Registers a read of UV set `uv` through transform `transform_id`.
    pub fn add(&mut self, base_name: &str, uv: u32, transform_id: u32) {
        let set = (uv as usize).min(MAX_UV_SETS - 1);
        self.used_uv[set] = true;

        if transform_id == 0 {
            self.used_unmodified_uv[set] = true;
            return;
        }

        // dedupe on (id, set)
        let uv = set as u32;
        let key = transform_id + uv * 100;
        if self.transforms.iter().any(|t| t.id + t.uv * 100 == key) {
            return;
        }
        self.transforms.push(UvTransform {
            id: transform_id,
            uv,
            name: format!("texture_{base_name}MapTransform"),
        });
    }

    #[must_use]
    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }
}

/// Collects UV usage of every enabled map in `maps`.
#[must_use]
pub fn analyze_uv_usage<'a, I>(maps: I) -> UvUsage
where
    I: IntoIterator<Item = &'a TextureMapOptions>,
{
    let mut usage = UvUsage::default();
    for map in maps {
        if map.enabled {
            usage.add(&map.base_name, map.uv, map.transform_id);
        }
    }
    usage
}
