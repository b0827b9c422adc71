//! Shader Definition
//!
//! The immutable output of a generator: everything an external compiler needs
//! to build one program variant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_128;

use crate::resources::{ShaderDefines, ShaderLanguage};

/// Vertex attribute semantic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    #[serde(rename = "TEXCOORD0")]
    TexCoord0,
    #[serde(rename = "TEXCOORD1")]
    TexCoord1,
    Color,
    #[serde(rename = "BLENDWEIGHT")]
    BlendWeight,
    #[serde(rename = "BLENDINDICES")]
    BlendIndices,
    /// Generic numbered attribute (morph targets, instancing rows, ...).
    #[serde(untagged)]
    Attr(u8),
}

impl Semantic {
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Semantic::Position => "POSITION".into(),
            Semantic::Normal => "NORMAL".into(),
            Semantic::Tangent => "TANGENT".into(),
            Semantic::TexCoord0 => "TEXCOORD0".into(),
            Semantic::TexCoord1 => "TEXCOORD1".into(),
            Semantic::Color => "COLOR".into(),
            Semantic::BlendWeight => "BLENDWEIGHT".into(),
            Semantic::BlendIndices => "BLENDINDICES".into(),
            Semantic::Attr(n) => format!("ATTR{n}"),
        }
    }
}

/// Built-in vertex attribute names and their semantics.
pub const BUILTIN_ATTRIBUTES: &[(&str, Semantic)] = &[
    ("vertex_position", Semantic::Position),
    ("vertex_normal", Semantic::Normal),
    ("vertex_tangent", Semantic::Tangent),
    ("vertex_texCoord0", Semantic::TexCoord0),
    ("vertex_texCoord1", Semantic::TexCoord1),
    ("vertex_color", Semantic::Color),
    ("vertex_boneWeights", Semantic::BlendWeight),
    ("vertex_boneIndices", Semantic::BlendIndices),
];

/// WGSL spelling of a GLSL value type, used for fragment output aliases.
#[must_use]
pub fn glsl_to_wgsl_type(glsl: &str) -> Option<&'static str> {
    Some(match glsl {
        "float" => "f32",
        "vec2" => "vec2f",
        "vec3" => "vec3f",
        "vec4" => "vec4f",
        "int" => "i32",
        "ivec2" => "vec2i",
        "ivec3" => "vec3i",
        "ivec4" => "vec4i",
        "uint" => "u32",
        "uvec2" => "vec2u",
        "uvec3" => "vec3u",
        "uvec4" => "vec4u",
        "mat2" => "mat2x2f",
        "mat3" => "mat3x3f",
        "mat4" => "mat4x4f",
        _ => return None,
    })
}

/// Scans vertex source for `attribute` declarations and assigns semantics.
///
/// Built-in names map to their fixed semantic; any other attribute gets the
/// next free generic `ATTRn` slot. Both `attribute vec3 name;` and
/// `attribute name: vec3f;` forms are recognized.
#[must_use]
pub fn collect_attributes(vertex_code: &str) -> BTreeMap<String, Semantic> {
    let mut attributes = BTreeMap::new();
    let mut next_generic = 0u8;

    for line in vertex_code.lines() {
        let Some(rest) = line.trim_start().strip_prefix("attribute ") else {
            continue;
        };
        let declaration = rest.trim_end().trim_end_matches(';');
        let name = match declaration.split_once(':') {
            Some((name, _)) => name.trim(),
            None => declaration.split_whitespace().last().unwrap_or_default(),
        };
        if name.is_empty() || attributes.contains_key(name) {
            continue;
        }

        let semantic = match BUILTIN_ATTRIBUTES.iter().find(|(n, _)| *n == name) {
            Some(&(_, semantic)) => semantic,
            None => {
                let semantic = Semantic::Attr(next_generic);
                next_generic += 1;
                semantic
            }
        };
        attributes.insert(name.to_string(), semantic);
    }
    attributes
}

/// Source and build inputs of one pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderStage {
    /// Complete stage source: preamble, shared chunks, defines, body.
    pub code: String,
    /// Named chunks the compiler may resolve `#include` directives against.
    pub includes: BTreeMap<String, String>,
    /// The stage defines already emitted into `code`.
    pub defines: ShaderDefines,
}

/// Provenance of a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionMetadata {
    /// Registered name of the generator that produced the definition.
    pub generator: String,
    /// Program key the definition is cached under.
    pub key: String,
    /// xxh3-128 of both stage sources.
    pub source_hash: u128,
}

/// A complete program variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderDefinition {
    pub name: String,
    pub shader_language: ShaderLanguage,
    pub attributes: BTreeMap<String, Semantic>,
    pub vertex: ShaderStage,
    pub fragment: ShaderStage,
    pub metadata: DefinitionMetadata,
}

impl ShaderDefinition {
    /// Hashes the final stage sources, the same way shader modules are
    /// deduplicated by source.
    #[must_use]
    pub fn compute_source_hash(vertex: &str, fragment: &str) -> u128 {
        let mut bytes = Vec::with_capacity(vertex.len() + fragment.len() + 1);
        bytes.extend_from_slice(vertex.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(fragment.as_bytes());
        xxh3_128(&bytes)
    }

    #[must_use]
    pub fn source_hash(&self) -> u128 {
        self.metadata.source_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_names() {
        assert_eq!(Semantic::TexCoord1.name(), "TEXCOORD1");
        assert_eq!(Semantic::Attr(12).name(), "ATTR12");
        assert_eq!(
            serde_json::to_string(&Semantic::BlendWeight).unwrap(),
            "\"BLENDWEIGHT\""
        );
    }

    #[test]
    fn test_wgsl_type_map() {
        assert_eq!(glsl_to_wgsl_type("vec4"), Some("vec4f"));
        assert_eq!(glsl_to_wgsl_type("uvec2"), Some("vec2u"));
        assert_eq!(glsl_to_wgsl_type("sampler2D"), None);
    }

    #[test]
    fn test_collect_attributes() {
        let vs = "attribute vec3 vertex_position;\n\
                  attribute vec4 aPosition;\n\
                  #ifdef UV0\n\
                  attribute vertex_texCoord0: vec2f;\n\
                  #endif\n\
                  attribute vec4 aExtra;\n";
        let attributes = collect_attributes(vs);
        assert_eq!(attributes["vertex_position"], Semantic::Position);
        assert_eq!(attributes["vertex_texCoord0"], Semantic::TexCoord0);
        assert_eq!(attributes["aPosition"], Semantic::Attr(0));
        assert_eq!(attributes["aExtra"], Semantic::Attr(1));
    }

    #[test]
    fn test_source_hash_separates_stages() {
        let a = ShaderDefinition::compute_source_hash("ab", "c");
        let b = ShaderDefinition::compute_source_hash("a", "bc");
        assert_ne!(a, b);
    }
}
