//! Shader Library
//!
//! Turns option records into complete program sources:
//!
//! ```text
//! options ──► generator ──► chunks + template ──► assembler ──► ShaderDefinition
//! ```
//!
//! - [`chunks`]: named source fragments per language, with overrides
//! - [`template`]: `$NAME` / `{NAME}` / `{i}` placeholder substitution
//! - [`options`]: the records that key a program variant
//! - [`programs`]: the generators
//! - [`assembler`]: preamble, defines and output aliases

pub mod assembler;
pub mod chunk_builder;
pub mod chunks;
pub mod definition;
pub mod options;
pub mod programs;
pub mod template;

pub use assembler::{AssembleRequest, ShaderAssembler, StageSource};
pub use chunk_builder::ChunkBuilder;
pub use chunks::{ChunkLibrary, ChunkOverrides};
pub use definition::{Semantic, ShaderDefinition, ShaderStage};
pub use options::{ProgramOptions, StandardMaterialOptions, prepare_standard};
pub use programs::{GenerationContext, ShaderGenerator};
