//! Chunk Library
//!
//! Named template fragments of shader source, one set per shading language.
//! The built-in chunks are embedded from `chunks/glsl` and `chunks/wgsl` at
//! compile time; the file stem is the chunk name (`diffusePS.glsl` →
//! `diffusePS`).
//!
//! A library is immutable once built. Caller overrides produce a new library
//! layered over the built-in one ([`ChunkLibrary::with_overrides`]), so a
//! library can be shared between threads without locking.

pub mod validation;

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_embed::RustEmbed;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ShaderLibError};
use crate::resources::ShaderLanguage;
use crate::shader_lib::definition::{BUILTIN_ATTRIBUTES, Semantic};
use crate::utils::interner;

pub use validation::{CHUNK_API_VERSION, ChunkApiVersion, ChunkDiagnostic};

#[derive(RustEmbed)]
#[folder = "src/shader_lib/chunks/glsl"]
struct GlslChunks;

#[derive(RustEmbed)]
#[folder = "src/shader_lib/chunks/wgsl"]
struct WgslChunks;

/// A named template fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub name: String,
    pub template: Arc<str>,
}

/// Caller-supplied chunks replacing built-in chunks of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkOverrides {
    /// Chunk API version the overrides were written against (`"2.6"`).
    pub api_version: Option<String>,
    pub glsl: BTreeMap<String, String>,
    pub wgsl: BTreeMap<String, String>,
}

impl ChunkOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_api_version(mut self, version: &str) -> Self {
        self.api_version = Some(version.to_string());
        self
    }

    #[must_use]
    pub fn with_chunk(mut self, language: ShaderLanguage, name: &str, template: &str) -> Self {
        let map = match language {
            ShaderLanguage::Glsl => &mut self.glsl,
            ShaderLanguage::Wgsl => &mut self.wgsl,
        };
        map.insert(name.to_string(), template.to_string());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glsl.is_empty() && self.wgsl.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
struct ChunkSet {
    chunks: FxHashMap<String, Arc<str>>,
    /// Built-in vertex attributes referenced by override chunks.
    override_attributes: BTreeMap<String, Semantic>,
}

impl ChunkSet {
    fn load<E: RustEmbed>() -> Result<Self> {
        let mut chunks = FxHashMap::default();
        for path in E::iter() {
            let Some(file) = E::get(&path) else {
                continue;
            };
            let source = std::str::from_utf8(file.data.as_ref())
                .map_err(|e| ShaderLibError::InvalidChunkAsset(format!("{path}: {e}")))?;
            let name = std::path::Path::new(path.as_ref())
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| ShaderLibError::InvalidChunkAsset(path.to_string()))?;
            chunks.insert(name.to_string(), Arc::from(source));
        }
        Ok(Self {
            chunks,
            override_attributes: BTreeMap::new(),
        })
    }

    fn apply(
        &mut self,
        overrides: &BTreeMap<String, String>,
        version: Option<ChunkApiVersion>,
        diagnostics: &mut Vec<ChunkDiagnostic>,
    ) {
        for (name, template) in overrides {
            let diagnostic = validation::validate(name, version);
            let removed = matches!(diagnostic, Some(ChunkDiagnostic::Removed { .. }));
            diagnostics.extend(diagnostic);
            if removed {
                continue;
            }

            for &(attribute, semantic) in BUILTIN_ATTRIBUTES {
                if template.contains(attribute) {
                    self.override_attributes
                        .insert(attribute.to_string(), semantic);
                }
            }
            self.chunks.insert(name.clone(), Arc::from(template.as_str()));
        }
    }
}

/// Immutable name → template registry for both shading languages.
#[derive(Debug, Clone)]
pub struct ChunkLibrary {
    glsl: ChunkSet,
    wgsl: ChunkSet,
}

impl ChunkLibrary {
    /// Loads the embedded engine chunks.
    pub fn builtin() -> Result<Self> {
        interner::preload_common_macros();
        Ok(Self {
            glsl: ChunkSet::load::<GlslChunks>()?,
            wgsl: ChunkSet::load::<WgslChunks>()?,
        })
    }

    /// Builds a library from in-memory chunk maps, without the embedded set.
    #[must_use]
    pub fn from_maps(glsl: &BTreeMap<String, String>, wgsl: &BTreeMap<String, String>) -> Self {
        let to_set = |map: &BTreeMap<String, String>| ChunkSet {
            chunks: map
                .iter()
                .map(|(k, v)| (k.clone(), Arc::from(v.as_str())))
                .collect(),
            override_attributes: BTreeMap::new(),
        };
        Self {
            glsl: to_set(glsl),
            wgsl: to_set(wgsl),
        }
    }

    /// Layers `overrides` over this library.
    ///
    /// Returns the new library together with every advisory finding: removed
    /// names are dropped, outdated chunks are applied anyway.
    #[must_use]
    pub fn with_overrides(&self, overrides: &ChunkOverrides) -> (Self, Vec<ChunkDiagnostic>) {
        let version = overrides
            .api_version
            .as_deref()
            .and_then(ChunkApiVersion::parse);
        let mut library = self.clone();
        let mut diagnostics = Vec::new();
        library
            .glsl
            .apply(&overrides.glsl, version, &mut diagnostics);
        library
            .wgsl
            .apply(&overrides.wgsl, version, &mut diagnostics);
        (library, diagnostics)
    }

    fn set(&self, language: ShaderLanguage) -> &ChunkSet {
        match language {
            ShaderLanguage::Glsl => &self.glsl,
            ShaderLanguage::Wgsl => &self.wgsl,
        }
    }

    /// Looks up a chunk.
    pub fn get(&self, language: ShaderLanguage, name: &str) -> Result<Chunk> {
        self.set(language)
            .chunks
            .get(name)
            .map(|template| Chunk {
                name: name.to_string(),
                template: Arc::clone(template),
            })
            .ok_or_else(|| ShaderLibError::missing_chunk(name, language))
    }

    /// Borrowing form of [`get`](Self::get).
    pub fn template(&self, language: ShaderLanguage, name: &str) -> Result<&str> {
        self.set(language)
            .chunks
            .get(name)
            .map(AsRef::as_ref)
            .ok_or_else(|| ShaderLibError::missing_chunk(name, language))
    }

    #[must_use]
    pub fn contains(&self, language: ShaderLanguage, name: &str) -> bool {
        self.set(language).chunks.contains_key(name)
    }

    #[must_use]
    pub fn len(&self, language: ShaderLanguage) -> usize {
        self.set(language).chunks.len()
    }

    /// All chunks of one language, sorted by name. Used as `#include` sources.
    #[must_use]
    pub fn includes(&self, language: ShaderLanguage) -> BTreeMap<String, String> {
        self.set(language)
            .chunks
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    /// Built-in attributes referenced by override chunks of `language`.
    #[must_use]
    pub fn override_attributes(&self, language: ShaderLanguage) -> &BTreeMap<String, Semantic> {
        &self.set(language).override_attributes
    }
}
