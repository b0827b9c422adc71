//! Variant Input Resources
//!
//! Plain data the generators read, independent of any generator:
//! - [`ShaderDefines`]: ordered macro map emitted as `#define` lines
//! - [`DeviceCapabilities`]: what the target device supports
//! - [`LightDescriptor`]: generator-relevant light state
//! - [`TextureMapOptions`]: per-slot texture state of a material

pub mod device;
pub mod light;
pub mod shader_defines;
pub mod texture_map;

pub use device::{DeviceCapabilities, Precision, ShaderLanguage};
pub use light::{
    CookieChannel, LightCookie, LightDescriptor, LightFalloff, LightMask, LightShape, LightType,
    ShadowType,
};
pub use shader_defines::ShaderDefines;
pub use texture_map::{
    DetailMode, MapTint, TEXTURE_SLOTS, TextureEncoding, TextureMapOptions, TextureSlot,
    texture_slot,
};
