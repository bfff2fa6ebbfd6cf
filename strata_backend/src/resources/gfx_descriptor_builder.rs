use strata_shared::derive_new::new;

use crate::gfx::{TextureInfo, TextureType, TextureViewInfo};

/// Turns the descriptors that the renderer presumes for a plain 2D texture into the
/// descriptors of a texture array. The fields that the array determines always win.
#[derive(new, Debug, Clone, Copy)]
pub struct GfxDescriptorBuilder {
    width: u32,
    height: u32,
    slices_count: u32,
}

impl GfxDescriptorBuilder {
    pub fn texture_info(&self, presumed: TextureInfo) -> TextureInfo {
        TextureInfo {
            ty: TextureType::Tex2dArray,
            width: self.width,
            height: self.height,
            layer_count: self.slices_count,
            ..presumed
        }
    }

    pub fn texture_view_info(&self, presumed: TextureViewInfo) -> TextureViewInfo {
        TextureViewInfo {
            ty: TextureType::Tex2dArray,
            base_layer: 0,
            layer_count: self.slices_count,
            ..presumed
        }
    }
}
