//! Descriptors that the renderer uses to create textures and texture views.

use serde::{Deserialize, Serialize};
use strata_content::PixelFormat;
use strata_shared::bitflags::bitflags;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    Tex1d,
    #[default]
    Tex2d,
    Tex3d,
    Cube,
    Tex1dArray,
    Tex2dArray,
}

/// Formats in which the renderer stores texels
#[allow(non_camel_case_types)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Unknown,
    R5G6B5,
    RGB5A1,
    RGBA4,
    RGB8,
    #[default]
    RGBA8,
    RGBA32F,
    A8,
    L8,
    LA8,
    ETC_RGB8,
    ETC2_RGBA8,
    PVRTC_RGB4,
    ASTC_RGBA_4X4,
}

impl From<PixelFormat> for Format {
    fn from(pixel_format: PixelFormat) -> Self {
        match pixel_format {
            PixelFormat::RGB565 => Format::R5G6B5,
            PixelFormat::RGB5A1 => Format::RGB5A1,
            PixelFormat::RGBA4444 => Format::RGBA4,
            PixelFormat::RGB888 => Format::RGB8,
            PixelFormat::RGBA8888 => Format::RGBA8,
            PixelFormat::RGBA32F => Format::RGBA32F,
            PixelFormat::A8 => Format::A8,
            PixelFormat::I8 => Format::L8,
            PixelFormat::AI8 => Format::LA8,
            PixelFormat::RGB_ETC1 => Format::ETC_RGB8,
            PixelFormat::RGBA_ETC2 => Format::ETC2_RGBA8,
            PixelFormat::RGB_PVRTC_4BPPV1 => Format::PVRTC_RGB4,
            PixelFormat::RGBA_ASTC_4X4 => Format::ASTC_RGBA_4X4,
        }
    }
}

bitflags! {
    /// How a texture is going to be used by the renderer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TextureUsage: u32 {
        const TRANSFER_SRC = 1;
        const TRANSFER_DST = 1 << 1;
        const SAMPLED = 1 << 2;
        const STORAGE = 1 << 3;
        const COLOR_ATTACHMENT = 1 << 4;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 5;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureFlags: u32 {
        /// The renderer generates the mipmap chain from level 0
        const GEN_MIPMAP = 1;
        const GENERAL_LAYOUT = 1 << 1;
    }
}

/// Filter that is used when sampling a texture. The discriminants are the persisted values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Filter {
    #[default]
    None = 0,
    Point = 1,
    Linear = 2,
    Anisotropic = 3,
}

impl TryFrom<u32> for Filter {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Filter::None),
            1 => Ok(Filter::Point),
            2 => Ok(Filter::Linear),
            3 => Ok(Filter::Anisotropic),
            _ => Err(value),
        }
    }
}

/// Addressing mode outside of the texture. The discriminants are the persisted values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum WrapMode {
    #[default]
    Repeat = 0,
    ClampToEdge = 1,
    MirroredRepeat = 2,
    ClampToBorder = 3,
}

impl TryFrom<u32> for WrapMode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WrapMode::Repeat),
            1 => Ok(WrapMode::ClampToEdge),
            2 => Ok(WrapMode::MirroredRepeat),
            3 => Ok(WrapMode::ClampToBorder),
            _ => Err(value),
        }
    }
}

/// Describes the texture that the renderer has to allocate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub ty: TextureType,
    pub usage: TextureUsage,
    pub format: Format,
    pub width: u32,
    pub height: u32,
    pub flags: TextureFlags,
    pub layer_count: u32,
    pub level_count: u32,
    pub samples: u32,
    pub depth: u32,
}

impl Default for TextureInfo {
    fn default() -> Self {
        Self {
            ty: TextureType::Tex2d,
            usage: TextureUsage::empty(),
            format: Format::RGBA8,
            width: 0,
            height: 0,
            flags: TextureFlags::empty(),
            layer_count: 1,
            level_count: 1,
            samples: 1,
            depth: 1,
        }
    }
}

/// Describes the part of a texture that shaders can see
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureViewInfo {
    pub ty: TextureType,
    pub format: Format,
    pub base_level: u32,
    pub level_count: u32,
    pub base_layer: u32,
    pub layer_count: u32,
}

impl Default for TextureViewInfo {
    fn default() -> Self {
        Self {
            ty: TextureType::Tex2d,
            format: Format::RGBA8,
            base_level: 0,
            level_count: 1,
            base_layer: 0,
            layer_count: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_shared::serde_yaml;

    use super::*;

    #[test]
    fn persisted_values() {
        assert_eq!(Filter::Linear as u32, 2);
        assert_eq!(WrapMode::try_from(2), Ok(WrapMode::MirroredRepeat));
        assert_eq!(Filter::try_from(4), Err(4));
    }

    #[test]
    fn pixel_format_mapping() {
        assert_eq!(Format::from(PixelFormat::default()), Format::RGBA8);
        assert_eq!(Format::from(PixelFormat::I8), Format::L8);
        assert_eq!(Format::from(PixelFormat::RGBA_ASTC_4X4), Format::ASTC_RGBA_4X4);
    }

    #[test]
    fn usage_from_yaml() {
        let usage: TextureUsage = serde_yaml::from_str("SAMPLED | TRANSFER_DST").unwrap();
        assert_eq!(usage, TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST);
    }
}
