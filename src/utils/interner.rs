//! Global String Interner
//!
//! Converts define names and values into compact integer [`Symbol`]s so that
//! [`ShaderDefines`](crate::resources::ShaderDefines) can be cloned, compared
//! and merged without copying strings.
//!
//! The pool only grows; it is a string cache, not a registry, so sharing it
//! across program caches has no observable effect on generated output.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Compact integer identifier of an interned string.
pub type Symbol = Spur;

/// Interns a string, returning its Symbol.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Returns the Symbol of an already interned string without allocating.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a Symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Pre-interns the define names every lit variant uses.
///
/// Called when a chunk library is created so the hot generation path rarely
/// has to grow the pool.
pub fn preload_common_macros() {
    let common = [
        "LIGHT_COUNT",
        "LIT_LIGHTING",
        "LIT_SPECULAR",
        "LIT_NEEDS_NORMAL",
        "LIT_ALPHA_TEST",
        "LIT_BLEND_TYPE",
        "LIT_FRESNEL_MODEL",
        "NORMALS",
        "TANGENTS",
        "UV0",
        "UV1",
        "UV0_UNMODIFIED",
        "UV1_UNMODIFIED",
        "UV_TRANSFORMS_COUNT",
        "VERTEX_COLOR",
        "SKIN",
        "INSTANCING",
        "FORWARD_PASS",
        "SHADOW_PASS",
        "",
        "1",
        "0",
    ];

    for name in common {
        intern(name);
    }
}
