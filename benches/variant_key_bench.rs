//! Variant key and cold generation benchmarks.
//!
//! `generate_key` runs on every material bind, so it must stay far cheaper
//! than a cold `create_shader_definition`.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use myth_shaderlib::prelude::*;
use myth_shaderlib::shader_lib::ChunkLibrary;
use myth_shaderlib::shader_lib::programs::StandardGenerator;
use myth_shaderlib::utils::hash_code;

fn material() -> StandardMaterialOptions {
    let mut material = StandardMaterialOptions::new()
        .with_map(TextureMapOptions::new("diffuse").with_texture(1))
        .with_map(TextureMapOptions::new("normal").with_texture(2))
        .with_map(TextureMapOptions::new("gloss").with_texture(1).with_channel("g"))
        .with_map(TextureMapOptions::new("emissive").with_texture(3));
    material.lit.use_metalness = true;
    material
}

fn lights(count: usize) -> Vec<LightDescriptor> {
    (0..count)
        .map(|i| match i % 3 {
            0 => LightDescriptor::directional().with_shadows(ShadowType::Pcf3F32),
            1 => LightDescriptor::omni(),
            _ => LightDescriptor::spot(),
        })
        .collect()
}

fn bench_hash(c: &mut Criterion) {
    let text = "lit.alpha_test:false\nlit.blend_type:\"none\"\n".repeat(64);
    c.bench_function("hash_code/2.5k", |b| b.iter(|| hash_code(black_box(&text))));
}

fn bench_generate_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_key");
    for count in [0, 4, 16] {
        let options: ProgramOptions =
            prepare_standard(&material(), &lights(count), ShaderPass::Forward).into();
        for width in [KeyWidth::Narrow, KeyWidth::Wide] {
            group.bench_with_input(
                BenchmarkId::new(format!("{width:?}"), count),
                &options,
                |b, options| b.iter(|| StandardGenerator.generate_key(black_box(options), width)),
            );
        }
    }
    group.finish();
}

fn bench_cold_generation(c: &mut Criterion) {
    let chunks = Arc::new(ChunkLibrary::builtin().expect("builtin chunks"));
    let options: ProgramOptions =
        prepare_standard(&material(), &lights(4), ShaderPass::Forward).into();

    c.bench_function("cold_standard_program", |b| {
        b.iter(|| {
            let cache = ProgramCache::new(
                DeviceCapabilities::modern(),
                chunks.clone(),
                ShaderLibSettings::default(),
            )
            .expect("cache");
            cache
                .get_or_create(STANDARD_GENERATOR, black_box(&options))
                .expect("program")
        });
    });
}

criterion_group!(benches, bench_hash, bench_generate_key, bench_cold_generation);
criterion_main!(benches);
