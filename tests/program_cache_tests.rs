//! Program Cache Tests
//!
//! Tests for:
//! - At-most-once generation per key, sequential and concurrent
//! - Failed generations leave the entry empty and are retried
//! - Generator registry: replacement evicts, unregister, unknown names
//! - Program records: dump / precompile round trip
//! - Custom shaders

use std::sync::{Arc, Barrier};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Result;

use myth_shaderlib::{KeyWidth, ShaderLibError};
use myth_shaderlib::prelude::*;
use myth_shaderlib::resources::ShaderDefines;
use myth_shaderlib::shader_lib::{AssembleRequest, GenerationContext, StageSource};
use myth_shaderlib::utils::canonical_key_string;

/// Counts `create_shader_definition` calls; optionally fails the first ones.
struct CountingGenerator {
    calls: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl CountingGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            ..Self::new()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ShaderGenerator for CountingGenerator {
    fn key_string(&self, options: &ProgramOptions) -> myth_shaderlib::Result<String> {
        canonical_key_string(options)
    }

    fn create_shader_definition(
        &self,
        ctx: &GenerationContext<'_>,
        options: &ProgramOptions,
    ) -> myth_shaderlib::Result<ShaderDefinition> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ShaderLibError::MissingOption("albedo".to_string()));
        }

        let mut defines = ShaderDefines::new();
        defines.set("FAMILY", options.family());
        let mut request = AssembleRequest::new(ctx.generator_name, ctx.language);
        request.vertex = StageSource::new("void main(void) {}".to_string(), defines.clone());
        request.fragment = StageSource::new("void main(void) {}".to_string(), defines);
        ctx.assembler.assemble(ctx.device, ctx.chunks, request)
    }
}

/// Parks inside `create_shader_definition` until the test releases it.
struct GatedGenerator {
    inner: CountingGenerator,
    entered: Barrier,
    release: Barrier,
}

impl GatedGenerator {
    fn new() -> Self {
        Self {
            inner: CountingGenerator::new(),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        }
    }
}

impl ShaderGenerator for GatedGenerator {
    fn key_string(&self, options: &ProgramOptions) -> myth_shaderlib::Result<String> {
        self.inner.key_string(options)
    }

    fn create_shader_definition(
        &self,
        ctx: &GenerationContext<'_>,
        options: &ProgramOptions,
    ) -> myth_shaderlib::Result<ShaderDefinition> {
        self.entered.wait();
        self.release.wait();
        self.inner.create_shader_definition(ctx, options)
    }
}

fn cache() -> Result<ProgramCache> {
    let settings = ShaderLibSettings {
        prefer_wgsl: false,
        ..ShaderLibSettings::default()
    };
    Ok(ProgramCache::with_builtin_chunks(
        DeviceCapabilities::modern(),
        settings,
    )?)
}

fn sky(mip: u32) -> ProgramOptions {
    SkyboxOptions {
        mip,
        ..SkyboxOptions::default()
    }
    .into()
}

// ============================================================================
// At-most-once generation
// ============================================================================

#[test]
fn equal_requests_generate_once() -> Result<()> {
    let cache = cache()?;
    let generator = Arc::new(CountingGenerator::new());
    cache.register("counting", generator.clone());

    let first = cache.get_or_create("counting", &sky(0))?;
    let second = cache.get_or_create("counting", &sky(0))?;

    assert_eq!(generator.calls(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.metadata.generator, "counting");
    Ok(())
}

#[test]
fn distinct_requests_generate_separately() -> Result<()> {
    let cache = cache()?;
    let generator = Arc::new(CountingGenerator::new());
    cache.register("counting", generator.clone());

    cache.get_or_create("counting", &sky(0))?;
    cache.get_or_create("counting", &sky(1))?;
    cache.get_or_create("counting", &sky(0))?;

    assert_eq!(generator.calls(), 2);
    assert_eq!(cache.len(), 2);
    Ok(())
}

#[test]
fn concurrent_equal_requests_generate_once() -> Result<()> {
    let cache = cache()?;
    let generator = Arc::new(CountingGenerator::slow(Duration::from_millis(20)));
    cache.register("counting", generator.clone());

    let programs: Vec<Arc<ShaderDefinition>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| cache.get_or_create("counting", &sky(3))))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker panicked"))
            .collect::<myth_shaderlib::Result<_>>()
    })?;

    assert_eq!(generator.calls(), 1);
    assert!(programs.iter().all(|p| Arc::ptr_eq(p, &programs[0])));
    Ok(())
}

#[test]
fn concurrent_distinct_requests_all_complete() -> Result<()> {
    let cache = cache()?;
    let generator = Arc::new(CountingGenerator::slow(Duration::from_millis(5)));
    cache.register("counting", generator.clone());

    thread::scope(|scope| {
        for mip in 0..4 {
            let cache = &cache;
            scope.spawn(move || {
                for _ in 0..3 {
                    cache.get_or_create("counting", &sky(mip)).unwrap();
                }
            });
        }
    });

    assert_eq!(generator.calls(), 4);
    assert_eq!(cache.len(), 4);
    Ok(())
}

// ============================================================================
// Failure handling
// ============================================================================

#[test]
fn failed_generation_is_retried() -> Result<()> {
    let cache = cache()?;
    let generator = Arc::new(CountingGenerator::failing(1));
    cache.register("flaky", generator.clone());

    let err = cache.get_or_create("flaky", &sky(0)).unwrap_err();
    assert!(matches!(err, ShaderLibError::MissingOption(_)));
    assert!(cache.is_empty());
    assert!(cache.records().is_empty());

    let program = cache.get_or_create("flaky", &sky(0))?;
    assert_eq!(generator.calls(), 2);
    assert_eq!(program.fragment.defines.get("FAMILY"), Some("skybox"));
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[test]
fn unprepared_standard_options_are_rejected() -> Result<()> {
    let cache = cache()?;
    let raw: ProgramOptions = StandardMaterialOptions::new()
        .with_map(TextureMapOptions::new("diffuse").with_texture(1))
        .with_map(TextureMapOptions::new("emissive").with_texture(2))
        .into();

    let err = cache.get_or_create(STANDARD_GENERATOR, &raw).unwrap_err();
    assert!(matches!(err, ShaderLibError::MissingOption(_)));
    assert!(cache.is_empty());
    assert!(cache.records().is_empty());
    Ok(())
}

#[test]
fn unknown_generator_is_an_error() -> Result<()> {
    let cache = cache()?;
    let err = cache.get_or_create("toon", &sky(0)).unwrap_err();
    assert!(matches!(err, ShaderLibError::UnknownGenerator(ref name) if name == "toon"));
    Ok(())
}

#[test]
fn mismatched_options_are_rejected() -> Result<()> {
    let cache = cache()?;
    let err = cache
        .get_or_create(STANDARD_GENERATOR, &sky(0))
        .unwrap_err();
    assert!(matches!(err, ShaderLibError::OptionsMismatch { .. }));
    Ok(())
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn reregistering_replaces_and_evicts() -> Result<()> {
    let cache = cache()?;
    let old = Arc::new(CountingGenerator::new());
    let new = Arc::new(CountingGenerator::new());

    cache.register("custom", old.clone());
    cache.get_or_create("custom", &sky(0))?;
    cache.get_or_create(SKYBOX_GENERATOR, &sky(0))?;
    assert_eq!(cache.len(), 2);

    cache.register("custom", new.clone());
    assert_eq!(cache.len(), 1);

    cache.get_or_create("custom", &sky(0))?;
    assert_eq!(old.calls(), 1);
    assert_eq!(new.calls(), 1);
    Ok(())
}

#[test]
fn unregister_removes_generator_and_programs() -> Result<()> {
    let cache = cache()?;
    cache.register("custom", Arc::new(CountingGenerator::new()));
    cache.get_or_create("custom", &sky(0))?;

    assert!(cache.unregister("custom"));
    assert!(!cache.is_registered("custom"));
    assert!(cache.is_empty());
    assert!(!cache.unregister("custom"));
    assert!(cache.is_registered(STANDARD_GENERATOR));
    Ok(())
}

#[test]
fn replacement_during_generation_is_not_cached() -> Result<()> {
    let cache = cache()?;
    let old = Arc::new(GatedGenerator::new());
    let new = Arc::new(CountingGenerator::new());
    cache.register("swap", old.clone());

    let in_flight = thread::scope(|scope| {
        let worker = scope.spawn(|| cache.get_or_create("swap", &sky(0)));
        old.entered.wait();
        cache.register("swap", new.clone());
        old.release.wait();
        worker.join().expect("worker panicked")
    })?;

    assert_eq!(in_flight.fragment.defines.get("FAMILY"), Some("skybox"));
    assert!(cache.is_empty());
    assert!(cache.records().is_empty());

    let current = cache.get_or_create("swap", &sky(0))?;
    assert!(!Arc::ptr_eq(&in_flight, &current));
    assert_eq!(old.inner.calls(), 1);
    assert_eq!(new.calls(), 1);
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[test]
fn clear_forces_regeneration() -> Result<()> {
    let cache = cache()?;
    let generator = Arc::new(CountingGenerator::new());
    cache.register("counting", generator.clone());

    cache.get_or_create("counting", &sky(0))?;
    cache.clear();
    cache.get_or_create("counting", &sky(0))?;
    assert_eq!(generator.calls(), 2);
    Ok(())
}

// ============================================================================
// Records & custom shaders
// ============================================================================

#[test]
fn precompile_replays_recorded_programs() -> Result<()> {
    let source = cache()?;
    let material = StandardMaterialOptions::new()
        .with_map(TextureMapOptions::new("diffuse").with_texture(11));
    let standard: ProgramOptions =
        prepare_standard(&material, &[LightDescriptor::directional()], ShaderPass::Forward).into();
    source.get_or_create(STANDARD_GENERATOR, &standard)?;
    source.get_or_create(SKYBOX_GENERATOR, &sky(2))?;

    let json = source.dump_programs()?;
    let records: Vec<ProgramRecord> = serde_json::from_str(&json)?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].generator, STANDARD_GENERATOR);

    let target = cache()?;
    assert_eq!(target.precompile(&records)?, 2);
    let before = target.generation_count();
    let warmed = target.get_or_create(STANDARD_GENERATOR, &standard)?;
    assert_eq!(target.generation_count(), before);
    assert_eq!(
        warmed.fragment.code,
        source.get_or_create(STANDARD_GENERATOR, &standard)?.fragment.code
    );
    Ok(())
}

#[test]
fn recording_can_be_disabled() -> Result<()> {
    let settings = ShaderLibSettings {
        record_programs: false,
        ..ShaderLibSettings::default()
    };
    let cache = ProgramCache::with_builtin_chunks(DeviceCapabilities::modern(), settings)?;
    cache.get_or_create(SKYBOX_GENERATOR, &sky(0))?;
    assert!(cache.records().is_empty());
    assert_eq!(cache.dump_programs()?, "[]");
    Ok(())
}

#[test]
fn wide_verified_keys_behave_like_narrow_keys() -> Result<()> {
    let settings = ShaderLibSettings {
        key_width: KeyWidth::Wide,
        verify_keys: true,
        prefer_wgsl: false,
        ..ShaderLibSettings::default()
    };
    let cache = ProgramCache::with_builtin_chunks(DeviceCapabilities::modern(), settings)?;
    let generator = Arc::new(CountingGenerator::new());
    cache.register("counting", generator.clone());

    let a = cache.get_or_create("counting", &sky(0))?;
    let b = cache.get_or_create("counting", &sky(0))?;
    cache.get_or_create("counting", &sky(1))?;
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(generator.calls(), 2);
    Ok(())
}

#[test]
fn custom_shader_uses_chunk_includes() -> Result<()> {
    let cache = cache()?;
    let vertex = "attribute vec3 vertex_position;\nattribute vec2 aUv0;\nvoid main(void) {}\n";
    let fragment = "#include \"decodePS\"\nvoid main(void) {}\n";

    let mut desc = CustomShaderDesc::new("outline", vertex, fragment);
    desc.defines.set_flag("OUTLINE");
    let program = cache.create_shader(desc.clone())?;
    let again = cache.create_shader(desc)?;

    assert!(Arc::ptr_eq(&program, &again));
    assert_eq!(program.name, "outline");
    assert!(program.fragment.includes.contains_key("decodePS"));
    assert!(program.fragment.code.contains("#define OUTLINE"));
    assert!(program.attributes.contains_key("aUv0"));
    Ok(())
}
