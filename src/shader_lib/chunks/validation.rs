//! Chunk Override Validation
//!
//! Caller-supplied chunks are checked against two engine tables before they
//! are layered over the built-in library. Problems are advisory: a removed
//! name is ignored, an outdated chunk is still used. Each name is logged at
//! most once per process; the returned diagnostics are always complete.

use std::sync::LazyLock;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Chunk API version of the built-in library, `(major, minor)`.
pub const CHUNK_API_VERSION: ChunkApiVersion = ChunkApiVersion::new(2, 6);

/// Names that used to be engine chunks and are no longer read.
pub const REMOVED_CHUNKS: &[&str] = &[
    "ambientPrefilteredCubePS",
    "ambientPrefilteredCubeLodPS",
    "dpAtlasQuadPS",
    "genParaboloidPS",
    "prefilterCubemapPS",
    "reflectionDpAtlasPS",
    "reflectionPrefilteredCubePS",
    "reflectionPrefilteredCubeLodPS",
    "refractionPS",
    "skyboxPrefilteredCubePS",
    "skyboxPrefilteredCubeLodPS",
    "specularAaNonePS",
    "specularAaToksvigPS",
    "specularAaToksvigFastPS",
    "lightmapSingleVertPS",
    "lightmapDirAddPS",
];

/// Chunks whose contract changed, with the API version that changed it.
pub const VERSIONED_CHUNKS: &[(&str, ChunkApiVersion)] = &[
    ("litMainPS", ChunkApiVersion::new(2, 6)),
    ("litShaderArgsPS", ChunkApiVersion::new(2, 6)),
    ("lightEvaluationPS", ChunkApiVersion::new(2, 6)),
    ("clusteredLightPS", ChunkApiVersion::new(2, 5)),
    ("diffusePS", ChunkApiVersion::new(1, 65)),
    ("emissivePS", ChunkApiVersion::new(1, 65)),
    ("opacityPS", ChunkApiVersion::new(1, 65)),
    ("normalMapPS", ChunkApiVersion::new(1, 65)),
    ("aoPS", ChunkApiVersion::new(1, 65)),
    ("lightmapSinglePS", ChunkApiVersion::new(1, 65)),
    ("lightmapDirPS", ChunkApiVersion::new(1, 65)),
    ("litMainVS", ChunkApiVersion::new(2, 6)),
];

/// A `major.minor` chunk API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChunkApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ChunkApiVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parses `"1.65"`. Returns `None` for anything else.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (major, minor) = text.trim().split_once('.')?;
        Some(Self::new(major.parse().ok()?, minor.parse().ok()?))
    }
}

impl std::fmt::Display for ChunkApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Advisory finding about a caller-supplied chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChunkDiagnostic {
    /// The override targets a chunk that no longer exists; it is ignored.
    Removed { name: String },
    /// The override predates the chunk's current contract; it is still used.
    Outdated {
        name: String,
        supplied: Option<ChunkApiVersion>,
        required: ChunkApiVersion,
    },
}

impl ChunkDiagnostic {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ChunkDiagnostic::Removed { name } | ChunkDiagnostic::Outdated { name, .. } => name,
        }
    }
}

impl std::fmt::Display for ChunkDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkDiagnostic::Removed { name } => {
                write!(f, "Shader chunk '{name}' has been removed and is no longer supported")
            }
            ChunkDiagnostic::Outdated {
                name,
                supplied,
                required,
            } => {
                let supplied = supplied.map_or_else(|| "none".to_string(), |v| v.to_string());
                write!(
                    f,
                    "Shader chunk '{name}' is API version {required}, but the supplied chunk is version {supplied}. Please update to the latest API"
                )
            }
        }
    }
}

static REPORTED: LazyLock<Mutex<FxHashSet<String>>> =
    LazyLock::new(|| Mutex::new(FxHashSet::default()));

fn report_once(diagnostic: &ChunkDiagnostic) {
    let first = REPORTED.lock().insert(diagnostic.name().to_string());
    if first {
        log::warn!("{diagnostic}");
    }
}

#[must_use]
pub fn is_removed(name: &str) -> bool {
    REMOVED_CHUNKS.contains(&name)
}

#[must_use]
pub fn required_version(name: &str) -> Option<ChunkApiVersion> {
    VERSIONED_CHUNKS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, v)| v)
}

/// Validates one override. Logs the finding (once per name) and returns it.
pub fn validate(name: &str, supplied: Option<ChunkApiVersion>) -> Option<ChunkDiagnostic> {
    let diagnostic = if is_removed(name) {
        ChunkDiagnostic::Removed {
            name: name.to_string(),
        }
    } else {
        let required = required_version(name)?;
        if supplied.is_some_and(|v| v >= required) {
            return None;
        }
        ChunkDiagnostic::Outdated {
            name: name.to_string(),
            supplied,
            required,
        }
    };
    report_once(&diagnostic);
    Some(diagnostic)
}
