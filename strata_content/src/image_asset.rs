use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use strata_shared::log::trace;

use crate::{
    common::{AssetClass, AssetKey, ClassId},
    Error, Result,
};

/// Pixel formats an [`ImageAsset`] can be stored in
#[allow(non_camel_case_types)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    RGB565,
    RGB5A1,
    RGBA4444,
    RGB888,
    #[default]
    RGBA8888,
    RGBA32F,
    A8,
    I8,
    AI8,
    RGB_ETC1,
    RGBA_ETC2,
    RGB_PVRTC_4BPPV1,
    RGBA_ASTC_4X4,
}

impl PixelFormat {
    /// Returns `true` for block compressed formats
    pub fn is_compressed(&self) -> bool {
        matches!(
            self,
            PixelFormat::RGB_ETC1 | PixelFormat::RGBA_ETC2 | PixelFormat::RGB_PVRTC_4BPPV1 | PixelFormat::RGBA_ASTC_4X4
        )
    }
}

/// Image data that is referenced by textures.
///
/// An `ImageAsset` either holds a single image or a complete mipmap chain that is
/// stored level after level in one buffer. In the latter case `mipmap_level_data_size`
/// lists the number of bytes of every level, starting with level 0.
#[derive(Clone, PartialEq)]
pub struct ImageAsset {
    key: AssetKey,
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Arc<Vec<u8>>,
    mipmap_level_data_size: Vec<usize>,
}

impl AssetClass for ImageAsset {
    const CLASS_ID: ClassId = ClassId::new("strata.ImageAsset");
}

impl ImageAsset {
    /// Creates a new [`ImageAssetBuilder`]
    pub fn builder(key: impl Into<AssetKey>) -> ImageAssetBuilder {
        ImageAssetBuilder::new(key.into())
    }

    /// Creates the 2x2 checkerboard that is used when no image is available.
    pub fn default_image(key: impl Into<AssetKey>) -> Arc<ImageAsset> {
        const MAGENTA: [u8; 4] = [255, 0, 255, 255];
        const BLACK: [u8; 4] = [0, 0, 0, 255];
        let data = [MAGENTA, BLACK, BLACK, MAGENTA].concat();
        Arc::new(ImageAsset {
            key: key.into(),
            width: 2,
            height: 2,
            format: PixelFormat::RGBA8888,
            data: Arc::new(data),
            mipmap_level_data_size: Vec::new(),
        })
    }

    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mipmap_level_data_size(&self) -> &[usize] {
        &self.mipmap_level_data_size
    }

    /// Returns `true` when the image carries an embedded mipmap chain
    pub fn has_embedded_mipmaps(&self) -> bool {
        !self.mipmap_level_data_size.is_empty()
    }

    /// Splits the embedded mipmap chain into one image per level, level 0 first.
    ///
    /// An image without an embedded chain is its own chain of length 1.
    pub fn extract_mipmaps(self: &Arc<Self>) -> Vec<Arc<ImageAsset>> {
        if !self.has_embedded_mipmaps() {
            return vec![self.clone()];
        }
        trace!("Extracting {} mipmap levels from '{}'", self.mipmap_level_data_size.len(), self.key);
        let mut offset = 0;
        self.mipmap_level_data_size
            .iter()
            .enumerate()
            .map(|(level, &size)| {
                let image = self.level_image(level, offset, size);
                offset += size;
                image
            })
            .collect()
    }

    /// Returns the image of level 0 without the rest of the chain.
    pub fn extract_base(self: &Arc<Self>) -> Arc<ImageAsset> {
        match self.mipmap_level_data_size.first() {
            Some(&size) => self.level_image(0, 0, size),
            None => self.clone(),
        }
    }

    fn level_image(&self, level: usize, offset: usize, size: usize) -> Arc<ImageAsset> {
        let shift = level.min(31) as u32;
        Arc::new(ImageAsset {
            key: AssetKey::new(format!("{}@{level}", self.key.as_str())),
            width: (self.width >> shift).max(1),
            height: (self.height >> shift).max(1),
            format: self.format,
            data: Arc::new(self.data[offset..offset + size].to_vec()),
            mipmap_level_data_size: Vec::new(),
        })
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("key", &self.key)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("data", &self.data.len())
            .field("mipmap_level_data_size", &self.mipmap_level_data_size)
            .finish()
    }
}

/// Builder for an [`ImageAsset`]
pub struct ImageAssetBuilder {
    key: AssetKey,
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
    mipmap_level_data_size: Vec<usize>,
}

impl ImageAssetBuilder {
    fn new(key: AssetKey) -> Self {
        Self {
            key,
            width: 0,
            height: 0,
            format: PixelFormat::default(),
            data: Vec::new(),
            mipmap_level_data_size: Vec::new(),
        }
    }

    /// Sets the size of level 0
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Sets the byte sizes of the embedded mipmap levels
    pub fn with_mipmap_level_data_size(mut self, mipmap_level_data_size: Vec<usize>) -> Self {
        self.mipmap_level_data_size = mipmap_level_data_size;
        self
    }

    /// Builds the [`ImageAsset`] and checks that the mipmap levels fit into the data.
    pub fn build(self) -> Result<Arc<ImageAsset>> {
        let required = self
            .mipmap_level_data_size
            .iter()
            .try_fold(0usize, |sum, &size| sum.checked_add(size));
        // Sizes that overflow can never fit into the data
        if !matches!(required, Some(required) if required <= self.data.len()) {
            return Err(Error::InvalidMipmapLayout {
                identifier: self.key,
                required: required.unwrap_or(usize::MAX),
                available: self.data.len(),
            });
        }
        Ok(Arc::new(ImageAsset {
            key: self.key,
            width: self.width,
            height: self.height,
            format: self.format,
            data: Arc::new(self.data),
            mipmap_level_data_size: self.mipmap_level_data_size,
        }))
    }
}
