//! Pass-Through Generator
//!
//! Serves one prebuilt [`ShaderDefinition`] under a fixed key. Used for
//! custom shaders whose source the caller supplies directly.

use crate::errors::Result;
use crate::shader_lib::definition::ShaderDefinition;
use crate::shader_lib::options::ProgramOptions;
use crate::shader_lib::programs::{GenerationContext, ShaderGenerator};

#[derive(Debug, Clone)]
pub struct PassThroughGenerator {
    key: String,
    definition: ShaderDefinition,
}

impl PassThroughGenerator {
    /// Wraps `definition`; its name and source hash form the key.
    #[must_use]
    pub fn new(definition: ShaderDefinition) -> Self {
        let key = format!(
            "pass_through:{}:{:032x}",
            definition.name, definition.metadata.source_hash
        );
        Self { key, definition }
    }

    #[must_use]
    pub fn definition(&self) -> &ShaderDefinition {
        &self.definition
    }
}

impl ShaderGenerator for PassThroughGenerator {
    /// The options are ignored: there is exactly one variant.
    fn key_string(&self, _options: &ProgramOptions) -> Result<String> {
        Ok(self.key.clone())
    }

    fn create_shader_definition(
        &self,
        _ctx: &GenerationContext<'_>,
        _options: &ProgramOptions,
    ) -> Result<ShaderDefinition> {
        Ok(self.definition.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::resources::ShaderLanguage;
    use crate::shader_lib::definition::{DefinitionMetadata, ShaderStage};
    use crate::shader_lib::options::SkyboxOptions;
    use crate::utils::KeyWidth;

    #[test]
    fn test_key_ignores_options() {
        let definition = ShaderDefinition {
            name: "custom".to_string(),
            shader_language: ShaderLanguage::Glsl,
            attributes: BTreeMap::new(),
            vertex: ShaderStage::default(),
            fragment: ShaderStage::default(),
            metadata: DefinitionMetadata::default(),
        };
        let generator = PassThroughGenerator::new(definition);
        let a = generator
            .generate_key(&ProgramOptions::Empty, KeyWidth::Narrow)
            .unwrap();
        let b = generator
            .generate_key(&SkyboxOptions::default().into(), KeyWidth::Narrow)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(generator.definition().name, "custom");
    }
}
