//! Light Descriptors
//!
//! The per-light state a lit generator branches on. Each descriptor exposes a
//! bit-packed [`LightDescriptor::key`] covering every field that changes the
//! generated per-light code, so lights can be folded into a program key
//! without serializing their full structure.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightType {
    #[default]
    Directional,
    Omni,
    Spot,
}

impl LightType {
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            LightType::Directional => 0,
            LightType::Omni => 1,
            LightType::Spot => 2,
        }
    }

    /// Upper-case name used in pass names and defines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            LightType::Directional => "DIRECTIONAL",
            LightType::Omni => "OMNI",
            LightType::Spot => "SPOT",
        }
    }
}

/// Emitter shape. Anything but `Punctual` is an area light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightShape {
    #[default]
    Punctual,
    Rect,
    Disk,
    Sphere,
}

impl LightShape {
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            LightShape::Punctual => 0,
            LightShape::Rect => 1,
            LightShape::Disk => 2,
            LightShape::Sphere => 3,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            LightShape::Punctual => "PUNCTUAL",
            LightShape::Rect => "RECT",
            LightShape::Disk => "DISK",
            LightShape::Sphere => "SPHERE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightFalloff {
    #[default]
    Linear,
    InverseSquared,
}

impl LightFalloff {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            LightFalloff::Linear => "LINEAR",
            LightFalloff::InverseSquared => "INVERSESQUARED",
        }
    }
}

/// Shadow map filtering technique and storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowType {
    #[serde(rename = "pcf1_32f")]
    Pcf1F32,
    #[default]
    #[serde(rename = "pcf3_32f")]
    Pcf3F32,
    #[serde(rename = "pcf5_32f")]
    Pcf5F32,
    #[serde(rename = "pcf1_16f")]
    Pcf1F16,
    #[serde(rename = "pcf3_16f")]
    Pcf3F16,
    #[serde(rename = "pcf5_16f")]
    Pcf5F16,
    #[serde(rename = "vsm_16f")]
    Vsm16F,
    #[serde(rename = "vsm_32f")]
    Vsm32F,
    #[serde(rename = "pcss_32f")]
    Pcss32F,
}

impl ShadowType {
    pub const ALL: [ShadowType; 9] = [
        ShadowType::Pcf1F32,
        ShadowType::Pcf3F32,
        ShadowType::Pcf5F32,
        ShadowType::Pcf1F16,
        ShadowType::Pcf3F16,
        ShadowType::Pcf5F16,
        ShadowType::Vsm16F,
        ShadowType::Vsm32F,
        ShadowType::Pcss32F,
    ];

    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            ShadowType::Pcf1F32 => 0,
            ShadowType::Pcf3F32 => 1,
            ShadowType::Pcf5F32 => 2,
            ShadowType::Pcf1F16 => 3,
            ShadowType::Pcf3F16 => 4,
            ShadowType::Pcf5F16 => 5,
            ShadowType::Vsm16F => 6,
            ShadowType::Vsm32F => 7,
            ShadowType::Pcss32F => 8,
        }
    }

    /// Full name, used for `SHADOW_TYPE` / `CLUSTER_SHADOW_TYPE_*` defines.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ShadowType::Pcf1F32 => "PCF1_32F",
            ShadowType::Pcf3F32 => "PCF3_32F",
            ShadowType::Pcf5F32 => "PCF5_32F",
            ShadowType::Pcf1F16 => "PCF1_16F",
            ShadowType::Pcf3F16 => "PCF3_16F",
            ShadowType::Pcf5F16 => "PCF5_16F",
            ShadowType::Vsm16F => "VSM_16F",
            ShadowType::Vsm32F => "VSM_32F",
            ShadowType::Pcss32F => "PCSS_32F",
        }
    }

    /// Sampling technique, shared between storage formats (`SHADOW_KIND_*`).
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            ShadowType::Pcf1F32 | ShadowType::Pcf1F16 => "PCF1",
            ShadowType::Pcf3F32 | ShadowType::Pcf3F16 => "PCF3",
            ShadowType::Pcf5F32 | ShadowType::Pcf5F16 => "PCF5",
            ShadowType::Vsm16F | ShadowType::Vsm32F => "VSM",
            ShadowType::Pcss32F => "PCSS",
        }
    }

    #[must_use]
    pub const fn is_vsm(self) -> bool {
        matches!(self, ShadowType::Vsm16F | ShadowType::Vsm32F)
    }

    /// Whether the shadow map is sampled with hardware depth comparison.
    #[must_use]
    pub const fn is_pcf(self) -> bool {
        !self.is_vsm() && !matches!(self, ShadowType::Pcss32F)
    }
}

/// Cookie texture channel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieChannel {
    R,
    G,
    B,
    A,
    #[default]
    Rgb,
}

impl CookieChannel {
    #[must_use]
    pub const fn swizzle(self) -> &'static str {
        match self {
            CookieChannel::R => "r",
            CookieChannel::G => "g",
            CookieChannel::B => "b",
            CookieChannel::A => "a",
            CookieChannel::Rgb => "rgb",
        }
    }

    const fn index(self) -> u32 {
        match self {
            CookieChannel::R => 0,
            CookieChannel::G => 1,
            CookieChannel::B => 2,
            CookieChannel::A => 3,
            CookieChannel::Rgb => 4,
        }
    }
}

/// Projected cookie texture configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightCookie {
    /// Omni lights project a cubemap cookie.
    pub cubemap: bool,
    pub falloff: bool,
    pub channel: CookieChannel,
    /// Cookie has a uv transform / offset applied.
    pub transform: bool,
}

bitflags! {
    /// Which kind of meshes a light affects.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LightMask: u32 {
        const AFFECT_DYNAMIC = 1;
        const AFFECT_LIGHTMAPPED = 2;
        const BAKE = 4;
    }
}

impl Default for LightMask {
    fn default() -> Self {
        LightMask::AFFECT_DYNAMIC
    }
}

/// The generator-relevant state of a single light.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LightDescriptor {
    pub light_type: LightType,
    pub shape: LightShape,
    pub falloff: LightFalloff,
    pub cast_shadows: bool,
    pub shadow_type: ShadowType,
    pub normal_offset_bias: bool,
    pub cookie: Option<LightCookie>,
    pub affect_specularity: bool,
    /// Requested directional shadow cascades. Read through
    /// [`LightDescriptor::cascades`].
    pub num_cascades: u32,
    pub mask: LightMask,
}

impl Default for LightDescriptor {
    fn default() -> Self {
        Self::new(LightType::Directional)
    }
}

impl LightDescriptor {
    #[must_use]
    pub fn new(light_type: LightType) -> Self {
        Self {
            light_type,
            shape: LightShape::Punctual,
            falloff: LightFalloff::Linear,
            cast_shadows: false,
            shadow_type: ShadowType::Pcf3F32,
            normal_offset_bias: false,
            cookie: None,
            affect_specularity: true,
            num_cascades: 1,
            mask: LightMask::AFFECT_DYNAMIC,
        }
    }

    #[must_use]
    pub fn directional() -> Self {
        Self::new(LightType::Directional)
    }

    #[must_use]
    pub fn omni() -> Self {
        Self::new(LightType::Omni)
    }

    #[must_use]
    pub fn spot() -> Self {
        Self::new(LightType::Spot)
    }

    #[must_use]
    pub fn with_shadows(mut self, shadow_type: ShadowType) -> Self {
        self.cast_shadows = true;
        self.shadow_type = shadow_type;
        self
    }

    #[must_use]
    pub fn with_shape(mut self, shape: LightShape) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub fn with_falloff(mut self, falloff: LightFalloff) -> Self {
        self.falloff = falloff;
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: LightCookie) -> Self {
        self.cookie = Some(cookie);
        self
    }

    #[must_use]
    pub fn with_cascades(mut self, num_cascades: u32) -> Self {
        self.num_cascades = num_cascades.clamp(1, 4);
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: LightMask) -> Self {
        self.mask = mask;
        self
    }

    #[must_use]
    pub fn with_normal_offset_bias(mut self, enabled: bool) -> Self {
        self.normal_offset_bias = enabled;
        self
    }

    #[must_use]
    pub fn with_affect_specularity(mut self, enabled: bool) -> Self {
        self.affect_specularity = enabled;
        self
    }

    /// Effective cascade count, `num_cascades` clamped to 1..=4.
    #[inline]
    #[must_use]
    pub fn cascades(&self) -> u32 {
        self.num_cascades.clamp(1, 4)
    }

    #[inline]
    #[must_use]
    pub fn is_area(&self) -> bool {
        self.shape != LightShape::Punctual
    }

    /// Bit-packed fingerprint of every field that affects per-light code.
    ///
    /// Layout (msb first): type:2 | shadows:1 | shadow type:4 | falloff:1 |
    /// normal offset:1 | cookie:1 | cookie falloff:1 | cookie channel:3 |
    /// cookie transform:1 | cookie cubemap:1 | shape:2 | specularity:1 |
    /// cascades:2 | mask:3
    #[must_use]
    pub fn key(&self) -> u32 {
        let cookie = self.cookie.unwrap_or_default();
        let has_cookie = self.cookie.is_some();
        (self.light_type.index() << 29)
            | (u32::from(self.cast_shadows) << 28)
            | (self.shadow_type.index() << 24)
            | (u32::from(self.falloff == LightFalloff::InverseSquared) << 23)
            | (u32::from(self.normal_offset_bias) << 22)
            | (u32::from(has_cookie) << 21)
            | (u32::from(has_cookie && cookie.falloff) << 20)
            | (if has_cookie { cookie.channel.index() << 17 } else { 0 })
            | (u32::from(has_cookie && cookie.transform) << 16)
            | (u32::from(has_cookie && cookie.cubemap) << 15)
            | (self.shape.index() << 13)
            | (u32::from(self.affect_specularity) << 12)
            | ((self.cascades() - 1) << 10)
            | (self.mask.bits() & 0x7)
    }
}
