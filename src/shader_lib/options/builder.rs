//! Option Builder
//!
//! Normalizes a material's raw options for one render pass so that the
//! generator can trust them and so that equal inputs always produce equal
//! option records (and therefore equal keys):
//!
//! 1. Map list canonicalized: one entry per known slot in slot order, unknown
//!    slots dropped, channels corrected, UV sets clamped.
//! 2. Texture identity converted into keyed sampler groups.
//! 3. Frontend-derived lit flags (normals, heights, AO, lightmap, vertex
//!    colors) set from the maps.
//! 4. Lights filtered by the pass's acceptance mask.
//! 5. Non-forward passes reduced to the opacity subset.

use rustc_hash::FxHashMap;

use crate::resources::{
    LightDescriptor, LightMask, TEXTURE_SLOTS, TextureMapOptions, texture_map::correct_channel,
};
use crate::shader_lib::options::lit::{LitShaderOptions, ShaderPass};
use crate::shader_lib::options::standard::StandardMaterialOptions;
use crate::shader_lib::options::uv::MAX_UV_SETS;

/// Builds the option record of `material` for `pass`, lit by `lights`.
#[must_use]
pub fn prepare_standard(
    material: &StandardMaterialOptions,
    lights: &[LightDescriptor],
    pass: ShaderPass,
) -> StandardMaterialOptions {
    for map in &material.maps {
        if !StandardMaterialOptions::is_known_slot(&map.base_name) {
            log::warn!("Ignoring unknown texture slot '{}'", map.base_name);
        }
    }

    let mut maps = canonical_maps(material);
    assign_sampler_groups(&mut maps);

    let mut options = StandardMaterialOptions {
        lit: material.lit.clone(),
        maps,
        normal_format: material.normal_format,
        prepared: true,
    };
    options.lit.pass = pass;
    derive_frontend_flags(&mut options);

    let accept = if options.lit.lightmap {
        LightMask::AFFECT_LIGHTMAPPED
    } else {
        LightMask::AFFECT_DYNAMIC
    };
    options.lit.light_mask_dynamic = accept.contains(LightMask::AFFECT_DYNAMIC);
    options.lit.lights = lights
        .iter()
        .filter(|light| light.mask.intersects(accept))
        .cloned()
        .collect();

    if !pass.is_forward() {
        reduce_to_min_options(&mut options);
    }
    options
}

fn canonical_maps(material: &StandardMaterialOptions) -> Vec<TextureMapOptions> {
    TEXTURE_SLOTS
        .iter()
        .map(|slot| {
            let mut map = material.map_or_default(slot.name);
            map.channel = correct_channel(slot, &map.channel);
            map.vertex_color_channel = correct_channel(slot, &map.vertex_color_channel);
            map.uv = map.uv.min(MAX_UV_SETS as u32 - 1);
            map
        })
        .collect()
}

/// Maps bound to the same texture share a sampler. Groups are numbered in
/// first-seen slot order; a map without texture identity gets its own group.
fn assign_sampler_groups(maps: &mut [TextureMapOptions]) {
    let mut groups: FxHashMap<u64, u32> = FxHashMap::default();
    let mut next = 0;
    for map in maps.iter_mut() {
        if !map.enabled {
            map.sampler_group = 0;
            continue;
        }
        map.sampler_group = match map.texture_id {
            Some(id) => *groups.entry(id).or_insert_with(|| {
                next += 1;
                next - 1
            }),
            None => {
                next += 1;
                next - 1
            }
        };
    }
}

fn derive_frontend_flags(options: &mut StandardMaterialOptions) {
    let uses = |name: &str| {
        options
            .map(name)
            .is_some_and(|m| m.enabled || m.vertex_color)
    };
    let use_normals = options.has_texture("normal");
    let use_heights = options.has_texture("height");
    let use_ao = uses("ao");
    let lightmap = uses("light");
    let clear_coat_normals = options.has_texture("clearCoatNormal");
    let vertex_colors = options.maps.iter().any(|m| m.vertex_color);

    let lit = &mut options.lit;
    lit.use_normals = use_normals;
    lit.use_heights = use_heights;
    lit.use_ao = use_ao;
    lit.lightmap = lightmap;
    lit.dir_lightmap &= lightmap;
    lit.use_clear_coat_normals = lit.use_clear_coat && clear_coat_normals;
    lit.vertex_colors |= vertex_colors;
}

/// Depth, pick, prepass and shadow variants only evaluate opacity.
fn reduce_to_min_options(options: &mut StandardMaterialOptions) {
    for map in &mut options.maps {
        if map.base_name != "opacity" {
            *map = TextureMapOptions::new(&map.base_name);
        }
    }

    let full = std::mem::take(&mut options.lit);
    let opacity_vertex_color = options
        .map("opacity")
        .is_some_and(|m| m.vertex_color);
    options.lit = LitShaderOptions {
        pass: full.pass,
        vertex_colors: opacity_vertex_color,
        vertex_color_gamma: full.vertex_color_gamma,
        skin: full.skin,
        use_instancing: full.use_instancing,
        use_morph_position: full.use_morph_position,
        use_morph_normal: full.use_morph_normal,
        use_morph_texture_based_int: full.use_morph_texture_based_int,
        screen_space: full.screen_space,
        pixel_snap: full.pixel_snap,
        nine_sliced_mode: full.nine_sliced_mode,
        linear_depth: full.linear_depth,
        blend_type: full.blend_type,
        alpha_test: full.alpha_test,
        alpha_to_coverage: full.alpha_to_coverage,
        opacity_dither: full.opacity_dither,
        opacity_shadow_dither: full.opacity_shadow_dither,
        use_specular: false,
        ..LitShaderOptions::default()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{LightType, ShadowType};

    fn material() -> StandardMaterialOptions {
        StandardMaterialOptions::new()
            .with_map(TextureMapOptions::new("diffuse").with_texture(10).with_channel("r"))
            .with_map(TextureMapOptions::new("gloss").with_texture(10).with_channel("rgb"))
            .with_map(TextureMapOptions::new("normal").with_texture(20).with_uv(5))
            .with_map(TextureMapOptions::new("sparkle").with_texture(30))
    }

    #[test]
    fn test_maps_are_canonicalized() {
        let options = prepare_standard(&material(), &[], ShaderPass::Forward);
        assert_eq!(options.maps.len(), TEXTURE_SLOTS.len());
        assert!(options.map("sparkle").is_none());
        assert_eq!(options.map("diffuse").unwrap().channel, "rrr");
        assert_eq!(options.map("gloss").unwrap().channel, "r");
        assert_eq!(options.map("normal").unwrap().uv, 1);

        let names: Vec<&str> = options.maps.iter().map(|m| m.base_name.as_str()).collect();
        let slots: Vec<&str> = TEXTURE_SLOTS.iter().map(|s| s.name).collect();
        assert_eq!(names, slots);
    }

    #[test]
    fn test_sampler_groups_follow_texture_identity() {
        let options = prepare_standard(&material(), &[], ShaderPass::Forward);
        let group = |name: &str| options.map(name).unwrap().sampler_group;
        // slot order: normal (20) comes before diffuse and gloss (10)
        assert_eq!(group("normal"), 0);
        assert_eq!(group("diffuse"), 1);
        assert_eq!(group("gloss"), 1);
    }

    #[test]
    fn test_texture_identity_does_not_change_record() {
        let a = StandardMaterialOptions::new()
            .with_map(TextureMapOptions::new("diffuse").with_texture(1));
        let b = StandardMaterialOptions::new()
            .with_map(TextureMapOptions::new("diffuse").with_texture(99));
        let pa = prepare_standard(&a, &[], ShaderPass::Forward);
        let pb = prepare_standard(&b, &[], ShaderPass::Forward);
        assert_eq!(
            crate::utils::canonical_key_string(&pa).unwrap(),
            crate::utils::canonical_key_string(&pb).unwrap()
        );
    }

    #[test]
    fn test_derived_flags() {
        let options = prepare_standard(&material(), &[], ShaderPass::Forward);
        assert!(options.lit.use_normals);
        assert!(!options.lit.use_heights);
        assert!(!options.lit.lightmap);
    }

    #[test]
    fn test_lights_filtered_by_mask() {
        let lights = [
            LightDescriptor::directional(),
            LightDescriptor::omni().with_mask(LightMask::AFFECT_LIGHTMAPPED),
        ];
        let options = prepare_standard(&material(), &lights, ShaderPass::Forward);
        assert_eq!(options.lit.lights.len(), 1);

        let lightmapped = material().with_map(TextureMapOptions::new("light").with_texture(5));
        let options = prepare_standard(&lightmapped, &lights, ShaderPass::Forward);
        assert_eq!(options.lit.lights.len(), 1);
        assert_eq!(options.lit.lights[0].light_type, LightType::Omni);
        assert!(!options.lit.light_mask_dynamic);
    }

    #[test]
    fn test_shadow_pass_reduces_options() {
        let mut raw = material().with_map(TextureMapOptions::new("opacity").with_texture(7));
        raw.lit.alpha_test = true;
        raw.lit.use_sheen = true;
        let pass = ShaderPass::Shadow {
            light_type: LightType::Spot,
            shadow_type: ShadowType::Pcf3F32,
        };
        let options = prepare_standard(&raw, &[LightDescriptor::spot()], pass);
        assert!(options.lit.lights.is_empty());
        assert!(options.lit.alpha_test);
        assert!(!options.lit.use_sheen);
        assert!(options.has_texture("opacity"));
        assert!(!options.has_texture("diffuse"));
        assert_eq!(options.lit.pass, pass);
    }
}
