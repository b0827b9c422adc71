//! Error Types
//!
//! This module defines the error types used throughout the shader library.
//!
//! # Overview
//!
//! The main error type [`ShaderLibError`] covers the failure modes that abort a
//! single shader generation:
//! - Unresolvable chunk references
//! - Unknown or mismatched generators
//! - Template and serialization failures
//!
//! Chunk override problems that have a sane fallback (removed or outdated
//! overrides) are *not* errors. They are reported as
//! [`ChunkDiagnostic`](crate::shader_lib::chunks::ChunkDiagnostic) values and
//! logged once per chunk name.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, ShaderLibError>`.
//!
//! ```rust,ignore
//! use myth_shaderlib::errors::{ShaderLibError, Result};
//!
//! fn generate() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::resources::device::ShaderLanguage;

/// The main error type for the shader library.
///
/// A failed generation never yields a partially built definition: the error is
/// returned from the single `create_shader_definition` call and the cache entry
/// stays unpopulated so a corrected call can retry.
#[derive(Error, Debug)]
pub enum ShaderLibError {
    // ========================================================================
    // Chunk Errors
    // ========================================================================
    /// A requested chunk name has no entry in the library.
    #[error("unknown chunk: {name} ({language})")]
    MissingChunk {
        /// The requested chunk name
        name: String,
        /// The language the chunk was requested for
        language: ShaderLanguage,
    },

    /// An embedded chunk asset could not be decoded.
    #[error("Invalid chunk asset: {0}")]
    InvalidChunkAsset(String),

    // ========================================================================
    // Generator Errors
    // ========================================================================
    /// No generator is registered under the requested name.
    #[error("No shader generator registered for: {0}")]
    UnknownGenerator(String),

    /// A generator was handed an option record of the wrong family.
    #[error("Generator '{generator}' expects {expected} options")]
    OptionsMismatch {
        /// The generator name
        generator: String,
        /// The option family the generator accepts
        expected: &'static str,
    },

    /// A required option field was not supplied.
    #[error("Missing required option: {0}")]
    MissingOption(String),

    /// An option value has no meaning for the generator (unknown output type, ...).
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    // ========================================================================
    // Template & Serialization Errors
    // ========================================================================
    /// Preamble template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// JSON serialization error (key canonicalization, program records, settings).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShaderLibError {
    /// Shorthand for [`ShaderLibError::MissingChunk`].
    #[must_use]
    pub fn missing_chunk(name: &str, language: ShaderLanguage) -> Self {
        ShaderLibError::MissingChunk {
            name: name.to_string(),
            language,
        }
    }
}

/// Alias for `Result<T, ShaderLibError>`.
pub type Result<T> = std::result::Result<T, ShaderLibError>;
