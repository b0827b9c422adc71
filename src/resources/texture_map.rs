//! Texture Map Slots
//!
//! Every texture input a standard material can sample is described by a
//! static [`TextureSlot`]. Per-variant state of a slot lives in
//! [`TextureMapOptions`], an ordered list of which is part of the material's
//! option record.

use std::sync::atomic::{AtomicBool, Ordering};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

static UNKNOWN_ENCODING_REPORTED: AtomicBool = AtomicBool::new(false);

/// Warns about the sRGB fallback on the first unknown encoding only.
/// Returns whether this call logged.
fn report_unknown_encoding() -> bool {
    let first = !UNKNOWN_ENCODING_REPORTED.swap(true, Ordering::Relaxed);
    if first {
        log::warn!("Unrecognized texture encoding, decoding as sRGB");
    }
    first
}

/// Static description of a material texture input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSlot {
    /// Base name: `diffuse`, `normal`, `ao`, ...
    pub name: &'static str,
    /// Number of color channels the slot reads, `0` for slots that are not
    /// channel addressable (normal maps).
    pub channels: usize,
    /// Channel swizzle used when the caller supplies none.
    pub default_channel: &'static str,
    /// UV set used when the caller supplies none.
    pub default_uv: u32,
    /// Chunk implementing the slot's `get*` function.
    pub chunk: &'static str,
}

const fn slot(
    name: &'static str,
    channels: usize,
    default_channel: &'static str,
    default_uv: u32,
    chunk: &'static str,
) -> TextureSlot {
    TextureSlot {
        name,
        channels,
        default_channel,
        default_uv,
        chunk,
    }
}

/// All texture slots, in the order their frontend code is emitted.
pub const TEXTURE_SLOTS: &[TextureSlot] = &[
    slot("height", 1, "g", 0, "parallaxPS"),
    slot("opacity", 1, "a", 0, "opacityPS"),
    slot("normalDetail", 0, "", 0, "normalDetailMapPS"),
    slot("normal", 0, "", 0, "normalMapPS"),
    slot("diffuseDetail", 3, "rgb", 0, "diffuseDetailMapPS"),
    slot("diffuse", 3, "rgb", 0, "diffusePS"),
    slot("refraction", 1, "r", 0, "transmissionPS"),
    slot("thickness", 1, "g", 0, "thicknessPS"),
    slot("iridescence", 1, "r", 0, "iridescencePS"),
    slot("iridescenceThickness", 1, "g", 0, "iridescenceThicknessPS"),
    slot("sheen", 3, "rgb", 0, "sheenPS"),
    slot("sheenGloss", 1, "a", 0, "sheenGlossPS"),
    slot("metalness", 1, "g", 0, "metalnessPS"),
    slot("specularityFactor", 1, "a", 0, "specularityFactorPS"),
    slot("specular", 3, "rgb", 0, "specularPS"),
    slot("gloss", 1, "g", 0, "glossPS"),
    slot("aoDetail", 1, "g", 0, "aoDetailMapPS"),
    slot("ao", 1, "g", 0, "aoPS"),
    slot("emissive", 3, "rgb", 0, "emissivePS"),
    slot("clearCoat", 1, "g", 0, "clearCoatPS"),
    slot("clearCoatGloss", 1, "g", 0, "clearCoatGlossPS"),
    slot("clearCoatNormal", 0, "", 0, "clearCoatNormalPS"),
    slot("light", 3, "rgb", 1, "lightmapSinglePS"),
];

/// Looks up a slot by base name.
#[must_use]
pub fn texture_slot(name: &str) -> Option<&'static TextureSlot> {
    TEXTURE_SLOTS.iter().find(|s| s.name == name)
}

/// Pads (repeating the last character) or truncates `channel` to the slot's
/// channel count. Slots without a channel count keep the value unchanged.
#[must_use]
pub fn correct_channel(slot: &TextureSlot, channel: &str) -> String {
    if slot.channels == 0 {
        return channel.to_string();
    }
    let mut chars: Vec<char> = channel.chars().collect();
    if chars.is_empty() {
        return slot.default_channel.to_string();
    }
    if chars.len() > slot.channels {
        chars.truncate(slot.channels);
    } else if let Some(&last) = chars.last() {
        chars.resize(slot.channels, last);
    }
    chars.into_iter().collect()
}

/// Color encoding of a texture's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureEncoding {
    #[default]
    Linear,
    Srgb,
    Rgbm,
    Rgbe,
    Rgbp,
    /// Anything the library does not recognize. Decoded as sRGB.
    #[serde(other)]
    Unknown,
}

impl TextureEncoding {
    /// Name of the decode function a chunk calls via `$DECODE`.
    #[must_use]
    pub fn decode_func(self) -> &'static str {
        match self {
            TextureEncoding::Linear => "decodeLinear",
            TextureEncoding::Srgb => "decodeGamma",
            TextureEncoding::Rgbm => "decodeRGBM",
            TextureEncoding::Rgbe => "decodeRGBE",
            TextureEncoding::Rgbp => "decodeRGBP",
            TextureEncoding::Unknown => {
                report_unknown_encoding();
                "decodeGamma"
            }
        }
    }
}

bitflags! {
    /// Material constant tint applied on top of a map.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MapTint: u8 {
        const FLOAT = 1;
        const COLOR = 2;
    }
}

/// Blend mode of a detail map over its base map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailMode {
    Mul,
    Add,
    Screen,
    Overlay,
    Min,
    Max,
}

impl DetailMode {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            DetailMode::Mul => "mul",
            DetailMode::Add => "add",
            DetailMode::Screen => "screen",
            DetailMode::Overlay => "overlay",
            DetailMode::Min => "min",
            DetailMode::Max => "max",
        }
    }
}

/// Variant state of a single texture slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureMapOptions {
    pub base_name: String,
    /// A texture is bound to this slot.
    pub enabled: bool,
    /// UV set the map samples.
    pub uv: u32,
    /// Channel swizzle (`r`, `rgb`, `aaa`, ...).
    pub channel: String,
    /// Id of the uv transform applied, `0` for none.
    pub transform_id: u32,
    pub tint: MapTint,
    pub vertex_color: bool,
    pub vertex_color_channel: String,
    pub encoding: Option<TextureEncoding>,
    pub invert: bool,
    pub detail_mode: Option<DetailMode>,
    /// Index of the sampler this map shares with other maps bound to the same
    /// texture. Derived from `texture_id` by the option builder.
    pub sampler_group: u32,
    /// Identity of the bound texture object. Volatile: never part of the key.
    #[serde(skip)]
    pub texture_id: Option<u64>,
}

impl Default for TextureMapOptions {
    fn default() -> Self {
        Self {
            base_name: String::new(),
            enabled: false,
            uv: 0,
            channel: String::new(),
            transform_id: 0,
            tint: MapTint::empty(),
            vertex_color: false,
            vertex_color_channel: String::new(),
            encoding: None,
            invert: false,
            detail_mode: None,
            sampler_group: 0,
            texture_id: None,
        }
    }
}

impl TextureMapOptions {
    /// Disabled options for slot `base_name`, with the slot's defaults.
    #[must_use]
    pub fn new(base_name: &str) -> Self {
        let (channel, uv) = texture_slot(base_name)
            .map_or(("", 0), |s| (s.default_channel, s.default_uv));
        Self {
            base_name: base_name.to_string(),
            uv,
            channel: channel.to_string(),
            vertex_color_channel: channel.to_string(),
            ..Self::default()
        }
    }

    /// Binds texture `texture_id` to the slot.
    #[must_use]
    pub fn with_texture(mut self, texture_id: u64) -> Self {
        self.enabled = true;
        self.texture_id = Some(texture_id);
        self
    }

    #[must_use]
    pub fn with_uv(mut self, uv: u32) -> Self {
        self.uv = uv;
        self
    }

    #[must_use]
    pub fn with_channel(mut self, channel: &str) -> Self {
        self.channel = channel.to_string();
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform_id: u32) -> Self {
        self.transform_id = transform_id;
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: TextureEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    #[must_use]
    pub fn with_tint(mut self, tint: MapTint) -> Self {
        self.tint = tint;
        self
    }

    #[must_use]
    pub fn with_vertex_color(mut self, channel: &str) -> Self {
        self.vertex_color = true;
        self.vertex_color_channel = channel.to_string();
        self
    }

    #[must_use]
    pub fn with_detail_mode(mut self, mode: DetailMode) -> Self {
        self.detail_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    #[must_use]
    pub fn slot(&self) -> Option<&'static TextureSlot> {
        texture_slot(&self.base_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_channel_truncates_and_pads() {
        let ao = texture_slot("ao").unwrap();
        assert_eq!(correct_channel(ao, "rgb"), "r");

        let diffuse = texture_slot("diffuse").unwrap();
        assert_eq!(correct_channel(diffuse, "a"), "aaa");
        assert_eq!(correct_channel(diffuse, "rg"), "rgg");
        assert_eq!(correct_channel(diffuse, "rgb"), "rgb");

        let normal = texture_slot("normal").unwrap();
        assert_eq!(correct_channel(normal, "xy"), "xy");
    }

    #[test]
    fn test_unknown_encoding_decodes_as_gamma() {
        let encoding: TextureEncoding = serde_json::from_str("\"logluv\"").unwrap();
        assert_eq!(encoding, TextureEncoding::Unknown);
        assert_eq!(encoding.decode_func(), "decodeGamma");
        assert_eq!(TextureEncoding::Srgb.decode_func(), "decodeGamma");
        assert_eq!(TextureEncoding::Linear.decode_func(), "decodeLinear");
    }

    #[test]
    fn test_unknown_encoding_reported_once() {
        assert_eq!(TextureEncoding::Unknown.decode_func(), "decodeGamma");
        assert!(!report_unknown_encoding());
        assert_eq!(TextureEncoding::Unknown.decode_func(), "decodeGamma");
        assert!(!report_unknown_encoding());
    }

    #[test]
    fn test_slot_defaults() {
        let light = TextureMapOptions::new("light");
        assert_eq!(light.uv, 1);
        assert_eq!(light.channel, "rgb");
        assert!(!light.enabled);

        let opacity = TextureMapOptions::new("opacity").with_texture(7);
        assert!(opacity.enabled);
        assert_eq!(opacity.channel, "a");
        assert_eq!(opacity.texture_id, Some(7));
    }

    #[test]
    fn test_texture_id_is_not_serialized() {
        let a = TextureMapOptions::new("diffuse").with_texture(1);
        let b = TextureMapOptions::new("diffuse").with_texture(2);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_slot_names_are_unique() {
        for (i, a) in TEXTURE_SLOTS.iter().enumerate() {
            for b in &TEXTURE_SLOTS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
