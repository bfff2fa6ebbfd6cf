use std::{
    fmt,
    ops::Range,
    sync::{mpsc::Sender, Arc},
};

use serde::{Deserialize, Serialize};
use strata_content::{AssetKey, ImageAsset, PixelFormat};
use strata_shared::{
    debug_info,
    log::{error, info, trace, warn},
    serde_yaml, thiserror, AsDebugInfo, DebugInfo,
};

use crate::{
    gfx::{TextureInfo, TextureUsage, TextureViewInfo},
    BaseTextureState, GfxDescriptorBuilder, MipSliceMatrix, Resource, ResourceEvent, ResourceReceiver,
};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("{image_count} images can't be grouped into levels of {slices_per_level} slices")]
    InvalidSliceGrouping { image_count: usize, slices_per_level: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Determines whether the image references of a texture array are persisted
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerializationMode {
    /// Texture arrays are only loaded. Saving them yields nothing.
    #[default]
    Runtime,
    /// Texture arrays are written by tools that export assets
    Export,
}

/// Configuration that is shared by the texture arrays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureArrayConfig {
    pub usage: TextureUsage,
    pub serialization_mode: SerializationMode,
}

impl Default for TextureArrayConfig {
    fn default() -> Self {
        Self {
            usage: TextureUsage::SAMPLED | TextureUsage::TRANSFER_DST,
            serialization_mode: SerializationMode::Runtime,
        }
    }
}

impl TextureArrayConfig {
    /// Reads the configuration from YAML. Missing fields keep their default.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_backend::texture_array::{SerializationMode, TextureArrayConfig};
    /// let config = TextureArrayConfig::from_yaml("serialization_mode: Export").unwrap();
    /// assert_eq!(config.serialization_mode, SerializationMode::Export);
    /// ```
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Shape of the texture that the renderer has to allocate. `None` selects the default.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TextureArrayCreateInfo {
    pub width: u32,
    pub height: u32,
    /// Defaults to [`PixelFormat::RGBA8888`]
    pub format: Option<PixelFormat>,
    /// Defaults to 1
    pub mipmap_level: Option<u32>,
    /// Defaults to 0
    pub base_level: Option<u32>,
    /// Defaults to 1000
    pub max_level: Option<u32>,
}

/// Event that is sent to the resource thread to update the texture arrays
#[derive(Debug)]
pub enum TextureArrayEvent {
    /// (Re)allocates the texture. Images that were assigned before are gone.
    Allocate {
        asset_key: AssetKey,
        texture_info: TextureInfo,
        texture_view_info: TextureViewInfo,
    },
    Release {
        asset_key: AssetKey,
    },
    AssignImage {
        asset_key: AssetKey,
        image: Arc<ImageAsset>,
        level: u32,
        slice: u32,
    },
}

/// Texture that consists of several 2D slices that share the size, format and mipmap levels.
///
/// The images are assigned with [`TextureArrayAsset::set_mipmaps`]. The raw slices are kept
/// as they are given and are the ones that get persisted. The images that are uploaded are
/// taken from the [`MipSliceMatrix`] that is derived from the raw slices.
pub struct TextureArrayAsset {
    asset_key: AssetKey,
    raw_slices: Vec<Vec<Arc<ImageAsset>>>,
    generated_mipmaps: MipSliceMatrix,
    base: BaseTextureState,
    config: TextureArrayConfig,
    resource_event_sender: Sender<ResourceEvent>,
    debug_info: DebugInfo,
}

impl TextureArrayAsset {
    /// Creates a new [`TextureArrayAssetBuilder`]
    pub fn builder() -> TextureArrayAssetBuilder {
        TextureArrayAssetBuilder::new()
    }

    /// Creates a texture array from a flat list of images.
    ///
    /// The images are grouped into entries of `slices_per_level` images that are then passed
    /// to [`TextureArrayAsset::set_mipmaps`].
    pub fn create(
        resource_receiver: &impl ResourceReceiver,
        images: Vec<Arc<ImageAsset>>,
        slices_per_level: usize,
    ) -> Result<TextureArrayAsset> {
        if images.is_empty() || slices_per_level == 0 || images.len() % slices_per_level != 0 {
            return Err(Error::InvalidSliceGrouping {
                image_count: images.len(),
                slices_per_level,
            });
        }
        let raw_slices = images.chunks(slices_per_level).map(<[_]>::to_vec).collect();
        let mut texture_array = Self::builder()
            .with_debug_info(debug_info!("TextureArrayAsset::create"))
            .build(resource_receiver);
        texture_array.set_mipmaps(raw_slices);
        Ok(texture_array)
    }

    /// Replaces the raw slices and reallocates the texture.
    ///
    /// When the raw slices can't be made rectangular the error is logged and the texture
    /// is released. The raw slices are kept in any case.
    pub fn set_mipmaps(&mut self, raw_slices: Vec<Vec<Arc<ImageAsset>>>) {
        info!("Setting {} mipmap entries of '{}'", raw_slices.len(), self.debug_info.name());
        self.raw_slices = raw_slices;
        self.generated_mipmaps = MipSliceMatrix::reconcile(&self.raw_slices).unwrap_or_else(|err| {
            error!("Failed to set the mipmaps of '{}': {err}", self.debug_info.name());
            MipSliceMatrix::default()
        });

        let create_info = match self.generated_mipmaps.base_image() {
            Some(base_image) => TextureArrayCreateInfo {
                width: base_image.width(),
                height: base_image.height(),
                format: Some(base_image.format()),
                mipmap_level: Some(self.generated_mipmaps.level_count() as u32),
                base_level: Some(self.base.base_level),
                max_level: Some(self.base.max_level),
            },
            None => TextureArrayCreateInfo {
                mipmap_level: Some(self.generated_mipmaps.level_count() as u32),
                base_level: Some(self.base.base_level),
                max_level: Some(self.base.max_level),
                ..Default::default()
            },
        };
        let mut events = vec![self.apply_reset(create_info)];
        events.extend(self.assign_image_events(0..self.generated_mipmaps.level_count()));
        self.send(events);
    }

    /// Reallocates the texture with the given shape. The images are not assigned again.
    pub fn reset(&mut self, create_info: TextureArrayCreateInfo) {
        let event = self.apply_reset(create_info);
        self.send(vec![event]);
    }

    fn apply_reset(&mut self, create_info: TextureArrayCreateInfo) -> TextureArrayEvent {
        self.base.width = create_info.width;
        self.base.height = create_info.height;
        self.base.format = create_info.format.unwrap_or_default();
        self.base.mipmap_level = create_info.mipmap_level.unwrap_or(1);
        self.base.base_level = create_info.base_level.unwrap_or(0);
        self.base.max_level = create_info.max_level.unwrap_or(1000);

        let asset_key = self.asset_key.clone();
        if self.base.mipmap_level == 0 || self.base.width == 0 || self.base.height == 0 {
            info!("Texture array '{}' has no texels and is released", self.debug_info.name());
            return TextureArrayEvent::Release { asset_key };
        }
        info!(
            "Allocating texture array '{}': {}x{} with {} slices and {} levels",
            self.debug_info.name(),
            self.base.width,
            self.base.height,
            self.slices_count(),
            self.base.mipmap_level
        );
        TextureArrayEvent::Allocate {
            asset_key,
            texture_info: self.texture_info(),
            texture_view_info: self.texture_view_info(),
        }
    }

    /// Assigns the images of `count` levels starting at `first_level` again.
    /// `None` selects all levels up to the last one.
    pub fn update_mipmaps(&mut self, first_level: usize, count: Option<usize>) {
        let level_count = self.generated_mipmaps.level_count();
        if first_level >= level_count {
            warn!("Level {first_level} is out of range for '{}' with {level_count} levels", self.debug_info.name());
            return;
        }
        let count = count.unwrap_or(level_count).min(level_count - first_level);
        if count == 0 {
            warn!("No levels of '{}' to update", self.debug_info.name());
            return;
        }
        let events = self.assign_image_events(first_level..first_level + count);
        self.send(events);
    }

    fn assign_image_events(&self, levels: Range<usize>) -> Vec<TextureArrayEvent> {
        self.generated_mipmaps
            .iter()
            .filter(|(level, _, _)| levels.contains(level))
            .map(|(level, slice, image)| {
                trace!("Assigning '{}' to level {level} slice {slice}", image.key());
                TextureArrayEvent::AssignImage {
                    asset_key: self.asset_key.clone(),
                    image: image.clone(),
                    level: level as u32,
                    slice: slice as u32,
                }
            })
            .collect()
    }

    fn send(&self, events: Vec<TextureArrayEvent>) {
        self.resource_event_sender
            .send(ResourceEvent::TextureArray(events))
            .expect("resource event cannot be sent");
    }

    /// Returns the number of slices of the texture
    pub fn slices_count(&self) -> u32 {
        self.generated_mipmaps.slice_count() as u32
    }

    /// Returns the first raw entry
    pub fn image(&self) -> Option<&[Arc<ImageAsset>]> {
        self.raw_slices.first().map(Vec::as_slice)
    }

    /// Replaces the raw slices with a single entry. `None` clears the texture.
    pub fn set_image(&mut self, images: Option<Vec<Arc<ImageAsset>>>) {
        match images {
            Some(images) => self.set_mipmaps(vec![images]),
            None => self.set_mipmaps(Vec::new()),
        }
    }

    /// Returns the raw slices as they were given
    pub fn mipmaps(&self) -> &[Vec<Arc<ImageAsset>>] {
        &self.raw_slices
    }

    pub fn generated_mipmaps(&self) -> &MipSliceMatrix {
        &self.generated_mipmaps
    }

    /// Returns `true` when images are assigned
    pub fn validate(&self) -> bool {
        !self.raw_slices.is_empty()
    }

    /// Drops the images and releases the texture
    pub fn destroy(&mut self) {
        info!("Destroying texture array '{}'", self.debug_info.name());
        self.raw_slices.clear();
        self.generated_mipmaps = MipSliceMatrix::default();
        self.send(vec![TextureArrayEvent::Release {
            asset_key: self.asset_key.clone(),
        }]);
    }

    pub fn release_texture(&mut self) {
        self.destroy();
    }

    /// Allocates the texture for the raw slices that are already in place
    pub fn initialize(&mut self) {
        let raw_slices = std::mem::take(&mut self.raw_slices);
        self.set_mipmaps(raw_slices);
    }

    /// Called when the texture array was loaded and all image references are resolved
    pub fn on_loaded(&mut self) {
        self.initialize();
    }

    /// Assigns the default image as the only slice
    pub fn init_default(&mut self) {
        let image = ImageAsset::default_image(format!("{}@default", self.asset_key.as_str()));
        self.set_mipmaps(vec![vec![image]]);
    }

    pub(crate) fn install_raw_slices(&mut self, raw_slices: Vec<Vec<Arc<ImageAsset>>>) {
        self.raw_slices = raw_slices;
    }

    /// Returns the descriptor of the texture that the renderer has to allocate
    pub fn texture_info(&self) -> TextureInfo {
        self.descriptor_builder()
            .texture_info(self.base.presumed_texture_info(self.config.usage))
    }

    /// Returns the descriptor of the view that covers all slices
    pub fn texture_view_info(&self) -> TextureViewInfo {
        self.descriptor_builder().texture_view_info(self.base.presumed_texture_view_info())
    }

    fn descriptor_builder(&self) -> GfxDescriptorBuilder {
        GfxDescriptorBuilder::new(self.base.width, self.base.height, self.slices_count())
    }

    pub fn asset_key(&self) -> &AssetKey {
        &self.asset_key
    }

    pub fn base(&self) -> &BaseTextureState {
        &self.base
    }

    /// Returns the base state to change the sampler state
    pub fn base_mut(&mut self) -> &mut BaseTextureState {
        &mut self.base
    }

    pub fn config(&self) -> &TextureArrayConfig {
        &self.config
    }

    pub fn debug_info(&self) -> &DebugInfo {
        &self.debug_info
    }
}

impl fmt::Display for TextureArrayAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<TextureArray | SlicesCount = {} | Dimension = {}x{}>",
            self.slices_count(),
            self.base.width,
            self.base.height
        )
    }
}

impl fmt::Debug for TextureArrayAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureArrayAsset")
            .field("asset_key", &self.asset_key)
            .field("raw_slices", &self.raw_slices)
            .field("base", &self.base)
            .field("debug_info", &self.debug_info)
            .finish()
    }
}

impl AsDebugInfo for TextureArrayAsset {
    fn as_debug_info(&self) -> &DebugInfo {
        &self.debug_info
    }
}

impl Resource for TextureArrayAsset {}

/// Builder for a [`TextureArrayAsset`]
#[derive(Default)]
pub struct TextureArrayAssetBuilder {
    asset_key: Option<AssetKey>,
    base: Option<BaseTextureState>,
    config: Option<TextureArrayConfig>,
    debug_info: Option<DebugInfo>,
}

impl TextureArrayAssetBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Sets the [`AssetKey`]. A random key is generated when none is given.
    pub fn with_asset_key(mut self, asset_key: AssetKey) -> Self {
        self.asset_key = Some(asset_key);
        self
    }

    pub fn with_base_state(mut self, base: BaseTextureState) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_config(mut self, config: TextureArrayConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_debug_info(mut self, debug_info: DebugInfo) -> Self {
        self.debug_info = Some(debug_info);
        self
    }

    /// Builds an empty [`TextureArrayAsset`]. Nothing is sent to the renderer before images are set.
    ///
    /// Pass the renderer as the `resource_receiver` parameter.
    pub fn build(self, resource_receiver: &impl ResourceReceiver) -> TextureArrayAsset {
        TextureArrayAsset {
            asset_key: self.asset_key.unwrap_or_else(AssetKey::generate),
            raw_slices: Vec::new(),
            generated_mipmaps: MipSliceMatrix::default(),
            base: self.base.unwrap_or_default(),
            config: self.config.unwrap_or_default(),
            resource_event_sender: resource_receiver.sender().clone(),
            debug_info: self.debug_info.unwrap_or_else(|| debug_info!("Anonymous-TextureArrayAsset")),
        }
    }
}
