//! Program Cache
//!
//! Owner of every generated [`ShaderDefinition`] for one device. Programs are
//! addressed by `(generator name, VariantKey)`:
//!
//! ```text
//! get_or_create(name, options)
//!   └─ generator.generate_key(options)   cheap, every call
//!        ├─ hit  → Arc<ShaderDefinition>
//!        └─ miss → generator.create_shader_definition(...)   once per key
//! ```
//!
//! # At-most-once generation
//!
//! Each key owns a slot guarded by its own mutex. The first caller generates
//! while holding the slot lock; concurrent callers with an equal key block on
//! that slot and reuse the result. Requests for other keys proceed in
//! parallel. A failed generation leaves the slot empty, so the next request
//! retries.
//!
//! # Registry
//!
//! Generators are registered by name. Re-registering a name replaces the
//! generator and evicts every program it produced. Each registration carries
//! an epoch that is part of the slot key, so a request still generating with
//! a replaced generator can never publish its program to later requests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ShaderLibError};
use crate::resources::{DeviceCapabilities, ShaderDefines, ShaderLanguage};
use crate::settings::ShaderLibSettings;
use crate::shader_lib::assembler::{AssembleRequest, ShaderAssembler, StageSource};
use crate::shader_lib::chunks::ChunkLibrary;
use crate::shader_lib::definition::{Semantic, ShaderDefinition, collect_attributes};
use crate::shader_lib::options::ProgramOptions;
use crate::shader_lib::programs::{
    GenerationContext, PassThroughGenerator, ShaderGenerator, SkyboxGenerator, StandardGenerator,
};
use crate::utils::VariantKey;

/// Name the standard material generator is registered under.
pub const STANDARD_GENERATOR: &str = "standard";
/// Name the skybox generator is registered under.
pub const SKYBOX_GENERATOR: &str = "skybox";

/// A generated `(generator, options)` pair, replayable by
/// [`ProgramCache::precompile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    pub generator: String,
    pub options: ProgramOptions,
}

/// Caller-supplied shader source for [`ProgramCache::create_shader`].
#[derive(Debug, Clone, Default)]
pub struct CustomShaderDesc {
    /// Cache identity. Two calls with the same name share one definition.
    pub unique_name: String,
    pub vertex_code: String,
    pub fragment_code: String,
    /// Attribute semantics; scanned from `vertex_code` when empty.
    pub attributes: BTreeMap<String, Semantic>,
    pub defines: ShaderDefines,
    pub fragment_output_types: Vec<String>,
}

impl CustomShaderDesc {
    #[must_use]
    pub fn new(unique_name: &str, vertex_code: &str, fragment_code: &str) -> Self {
        Self {
            unique_name: unique_name.to_string(),
            vertex_code: vertex_code.to_string(),
            fragment_code: fragment_code.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct CachedProgram {
    definition: Arc<ShaderDefinition>,
    /// Canonical key string, kept only when key verification is enabled.
    key_string: Option<String>,
}

type Slot = Arc<Mutex<Option<CachedProgram>>>;

/// `(generator name, registration epoch, key)`.
type SlotKey = (String, u64, VariantKey);

#[derive(Clone)]
struct Registration {
    generator: Arc<dyn ShaderGenerator>,
    epoch: u64,
}

/// Per-device cache of generated programs.
pub struct ProgramCache {
    device: DeviceCapabilities,
    language: ShaderLanguage,
    chunks: Arc<ChunkLibrary>,
    assembler: ShaderAssembler,
    settings: ShaderLibSettings,

    generators: RwLock<FxHashMap<String, Registration>>,
    next_epoch: AtomicU64,
    slots: Mutex<FxHashMap<SlotKey, Slot>>,

    records: Mutex<Vec<ProgramRecord>>,
    precached: AtomicBool,
    generations: AtomicUsize,
}

impl std::fmt::Debug for ProgramCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramCache")
            .field("language", &self.language)
            .field("programs", &self.len())
            .field("generations", &self.generation_count())
            .finish_non_exhaustive()
    }
}

impl ProgramCache {
    /// Creates a cache for `device` with the built-in generators registered.
    pub fn new(
        device: DeviceCapabilities,
        chunks: Arc<ChunkLibrary>,
        settings: ShaderLibSettings,
    ) -> Result<Self> {
        let language = device.shader_language(settings.prefer_wgsl);
        let assembler = ShaderAssembler::new()?.with_debug_print(settings.debug_print_shaders);

        let cache = Self {
            device,
            language,
            chunks,
            assembler,
            settings,
            generators: RwLock::new(FxHashMap::default()),
            next_epoch: AtomicU64::new(0),
            slots: Mutex::new(FxHashMap::default()),
            records: Mutex::new(Vec::new()),
            precached: AtomicBool::new(false),
            generations: AtomicUsize::new(0),
        };
        cache.register(STANDARD_GENERATOR, Arc::new(StandardGenerator));
        cache.register(SKYBOX_GENERATOR, Arc::new(SkyboxGenerator));
        Ok(cache)
    }

    /// [`ProgramCache::new`] with the embedded chunk library.
    pub fn with_builtin_chunks(
        device: DeviceCapabilities,
        settings: ShaderLibSettings,
    ) -> Result<Self> {
        Self::new(device, Arc::new(ChunkLibrary::builtin()?), settings)
    }

    #[must_use]
    pub fn device(&self) -> &DeviceCapabilities {
        &self.device
    }

    #[must_use]
    pub fn language(&self) -> ShaderLanguage {
        self.language
    }

    #[must_use]
    pub fn chunks(&self) -> &ChunkLibrary {
        &self.chunks
    }

    #[must_use]
    pub fn settings(&self) -> &ShaderLibSettings {
        &self.settings
    }

    // ── Registry ─────────────────────────────────────────────────────────────

    /// Registers `generator` under `name`, replacing and evicting any previous
    /// registration.
    pub fn register(&self, name: &str, generator: Arc<dyn ShaderGenerator>) {
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let replaced = self
            .generators
            .write()
            .insert(name.to_string(), Registration { generator, epoch })
            .is_some();
        if replaced {
            let evicted = self.evict(name);
            log::debug!("Replaced shader generator '{name}', evicted {evicted} programs");
        }
    }

    /// Removes the generator `name` and its programs. Returns whether it was
    /// registered.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.generators.write().remove(name).is_some();
        if removed {
            self.evict(name);
        }
        removed
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.generators.read().contains_key(name)
    }

    fn registration(&self, name: &str) -> Result<Registration> {
        self.generators
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ShaderLibError::UnknownGenerator(name.to_string()))
    }

    fn is_current(&self, name: &str, epoch: u64) -> bool {
        self.generators
            .read()
            .get(name)
            .is_some_and(|registration| registration.epoch == epoch)
    }

    fn evict(&self, name: &str) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|(generator, _, _), _| generator != name);
        before - slots.len()
    }

    // ── Lookup ───────────────────────────────────────────────────────────────

    /// Returns the program of generator `name` for `options`, generating it on
    /// the first request for its key.
    pub fn get_or_create(
        &self,
        name: &str,
        options: &ProgramOptions,
    ) -> Result<Arc<ShaderDefinition>> {
        let Registration { generator, epoch } = self.registration(name)?;

        let (key, key_string) = if self.settings.verify_keys {
            let key_string = generator.key_string(options)?;
            let key = VariantKey::from_key_string(&key_string, self.settings.key_width);
            (key, Some(key_string))
        } else {
            (generator.generate_key(options, self.settings.key_width)?, None)
        };

        let slot_key = (name.to_string(), epoch, key);
        let slot = self
            .slots
            .lock()
            .entry(slot_key.clone())
            .or_default()
            .clone();
        let mut entry = slot.lock();

        if let Some(cached) = entry.as_ref() {
            if cached.key_string == key_string {
                return Ok(cached.definition.clone());
            }
            log::error!(
                "Program key collision in generator '{name}' for key {key}, generating uncached"
            );
            drop(entry);
            return self
                .generate(name, generator.as_ref(), options, key)
                .map(Arc::new);
        }

        if self.precached.load(Ordering::Relaxed) {
            log::debug!("Program cache miss after precompilation: {name} {key}");
        }

        let definition = Arc::new(self.generate(name, generator.as_ref(), options, key)?);
        if !self.is_current(name, epoch) {
            log::debug!("Generator '{name}' was replaced during generation, {key} not cached");
            let mut slots = self.slots.lock();
            if slots.get(&slot_key).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                slots.remove(&slot_key);
            }
            return Ok(definition);
        }
        if self.settings.record_programs {
            self.records.lock().push(ProgramRecord {
                generator: name.to_string(),
                options: options.clone(),
            });
        }
        *entry = Some(CachedProgram {
            definition: definition.clone(),
            key_string,
        });
        Ok(definition)
    }

    fn generate(
        &self,
        name: &str,
        generator: &dyn ShaderGenerator,
        options: &ProgramOptions,
        key: VariantKey,
    ) -> Result<ShaderDefinition> {
        let ctx = GenerationContext {
            device: &self.device,
            chunks: &self.chunks,
            assembler: &self.assembler,
            language: self.language,
            precision: self.settings.default_precision,
            generator_name: name,
        };
        let mut definition = generator.create_shader_definition(&ctx, options)?;
        definition.metadata.generator = name.to_string();
        definition.metadata.key = key.to_string();
        self.generations.fetch_add(1, Ordering::Relaxed);
        Ok(definition)
    }

    /// Builds a definition from caller source, with the chunk library
    /// available as includes. Cached by `desc.unique_name`.
    pub fn create_shader(&self, desc: CustomShaderDesc) -> Result<Arc<ShaderDefinition>> {
        if !self.is_registered(&desc.unique_name) {
            let attributes = if desc.attributes.is_empty() {
                collect_attributes(&desc.vertex_code)
            } else {
                desc.attributes
            };
            let includes = self.chunks.includes(self.language);

            let mut request = AssembleRequest::new(&desc.unique_name, self.language);
            request.attributes = attributes;
            request.vertex = StageSource {
                includes: includes.clone(),
                ..StageSource::new(desc.vertex_code, ShaderDefines::new())
            };
            request.fragment = StageSource {
                includes,
                ..StageSource::new(desc.fragment_code, ShaderDefines::new())
            };
            request.defines = desc.defines;
            request.fragment_output_types = desc.fragment_output_types;
            request.precision = self.settings.default_precision;

            let definition = self.assembler.assemble(&self.device, &self.chunks, request)?;
            self.register(
                &desc.unique_name,
                Arc::new(PassThroughGenerator::new(definition)),
            );
        }
        self.get_or_create(&desc.unique_name, &ProgramOptions::Empty)
    }

    // ── Maintenance ──────────────────────────────────────────────────────────

    /// Drops every cached program. Registrations and records are kept.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Number of cached programs.
    #[must_use]
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots.lock().values().cloned().collect();
        slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `create_shader_definition` calls that succeeded.
    #[must_use]
    pub fn generation_count(&self) -> usize {
        self.generations.load(Ordering::Relaxed)
    }

    // ── Records ──────────────────────────────────────────────────────────────

    #[must_use]
    pub fn records(&self) -> Vec<ProgramRecord> {
        self.records.lock().clone()
    }

    /// Serializes the recorded programs as JSON.
    pub fn dump_programs(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&*self.records.lock())?)
    }

    /// Generates every recorded program ahead of use. Records of generators
    /// this cache does not know are skipped.
    pub fn precompile(&self, records: &[ProgramRecord]) -> Result<usize> {
        let mut compiled = 0;
        for record in records {
            if !self.is_registered(&record.generator) {
                log::warn!(
                    "Skipping precompile record of unknown generator '{}'",
                    record.generator
                );
                continue;
            }
            self.get_or_create(&record.generator, &record.options)?;
            compiled += 1;
        }
        self.precached.store(true, Ordering::Relaxed);
        Ok(compiled)
    }

    /// [`ProgramCache::precompile`] from the output of
    /// [`ProgramCache::dump_programs`].
    pub fn precompile_json(&self, json: &str) -> Result<usize> {
        let records: Vec<ProgramRecord> = serde_json::from_str(json)?;
        self.precompile(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::TextureMapOptions;
    use crate::shader_lib::options::{ShaderPass, SkyboxOptions, StandardMaterialOptions};
    use crate::shader_lib::options::prepare_standard;

    fn cache(settings: ShaderLibSettings) -> ProgramCache {
        ProgramCache::with_builtin_chunks(DeviceCapabilities::modern(), settings).unwrap()
    }

    fn standard() -> ProgramOptions {
        let raw = StandardMaterialOptions::new()
            .with_map(TextureMapOptions::new("diffuse").with_texture(1));
        prepare_standard(&raw, &[], ShaderPass::Forward).into()
    }

    #[test]
    fn test_hit_returns_same_definition() {
        let cache = cache(ShaderLibSettings::default());
        let a = cache.get_or_create(STANDARD_GENERATOR, &standard()).unwrap();
        let b = cache.get_or_create(STANDARD_GENERATOR, &standard()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.generation_count(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(a.metadata.generator, STANDARD_GENERATOR);
        assert_eq!(a.metadata.key.len(), 16);
    }

    #[test]
    fn test_unknown_generator() {
        let cache = cache(ShaderLibSettings::default());
        let err = cache
            .get_or_create("toon", &ProgramOptions::Empty)
            .unwrap_err();
        assert!(matches!(err, ShaderLibError::UnknownGenerator(name) if name == "toon"));
    }

    #[test]
    fn test_verified_keys_hit() {
        let cache = cache(ShaderLibSettings {
            verify_keys: true,
            ..ShaderLibSettings::default()
        });
        let options: ProgramOptions = SkyboxOptions::default().into();
        let a = cache.get_or_create(SKYBOX_GENERATOR, &options).unwrap();
        let b = cache.get_or_create(SKYBOX_GENERATOR, &options).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_dump_and_precompile() {
        let source = cache(ShaderLibSettings::default());
        source.get_or_create(STANDARD_GENERATOR, &standard()).unwrap();
        source
            .get_or_create(SKYBOX_GENERATOR, &SkyboxOptions::default().into())
            .unwrap();
        let json = source.dump_programs().unwrap();

        let target = cache(ShaderLibSettings::default());
        assert_eq!(target.precompile_json(&json).unwrap(), 2);
        assert_eq!(target.len(), 2);
        target.get_or_create(STANDARD_GENERATOR, &standard()).unwrap();
        assert_eq!(target.generation_count(), 2);
    }

    #[test]
    fn test_create_shader_is_cached_by_name() {
        let cache = cache(ShaderLibSettings::default());
        let vertex = "attribute vertex_position: vec3f;\nattribute aUv: vec2f;\n";
        let fragment = "fn main() {}\n";
        let a = cache
            .create_shader(CustomShaderDesc::new("custom", vertex, fragment))
            .unwrap();
        let b = cache
            .create_shader(CustomShaderDesc::new("custom", vertex, fragment))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.attributes.get("vertex_position"), Some(&Semantic::Position));
        assert_eq!(a.attributes.get("aUv"), Some(&Semantic::Attr(0)));
        assert!(a.fragment.includes.contains_key("decodePS"));
        assert!(cache.is_registered("custom"));
    }
}
