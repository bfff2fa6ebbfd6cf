use std::{fs, io, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use strata_content::{AssetClass, AssetKey, AssetRegistry, DeferredReferences, ImageAsset, PendingReference};
use strata_shared::{
    log::{info, trace},
    serde_json, thiserror,
};

use crate::{
    texture_array::{SerializationMode, TextureArrayAssetBuilder},
    texture_base, BaseTextureState, ResourceReceiver, TextureArrayAsset,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("The identifier of slice {slice} in level {level} is missing")]
    MissingIdentifier { level: usize, slice: usize },
    #[error("The record is neither a texture array nor a base state: {0}")]
    InvalidRecord(String),
    #[error("Invalid base state: {0}")]
    Base(#[from] texture_base::Error),
    #[error("Failed to resolve the images: {0}")]
    Content(#[from] strata_content::Error),
    #[error("Failed to (de)serialize: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IoError: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Persisted form of a [`TextureArrayAsset`]
///
/// `mipmaps` holds the keys of the raw slices entry by entry. Only the first `slice`
/// keys of every entry are loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureArrayRecord {
    pub base: String,
    pub slice: u32,
    pub mipmaps: Vec<Vec<AssetKey>>,
}

impl TextureArrayRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// Format in which texture arrays are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecVersion {
    /// Only the base state is persisted. No images are referenced.
    Legacy,
    /// The base state and the keys of all images are persisted as a [`TextureArrayRecord`].
    Full,
}

impl CodecVersion {
    /// Determines the version of untagged data from its structure.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_backend::CodecVersion;
    /// assert_eq!(CodecVersion::detect(r#"{"base":"","slice":0,"mipmaps":[]}"#).unwrap(), CodecVersion::Full);
    /// assert_eq!(CodecVersion::detect(r#""2,2,0,0""#).unwrap(), CodecVersion::Legacy);
    /// ```
    pub fn detect(json: &str) -> Result<CodecVersion> {
        let value = serde_json::from_str::<serde_json::Value>(json)?;
        let is_full = value
            .as_object()
            .map_or(false, |object| object.contains_key("slice") && object.contains_key("mipmaps"));
        Ok(if is_full { CodecVersion::Full } else { CodecVersion::Legacy })
    }
}

/// Saves and loads [`TextureArrayAsset`]s
#[derive(Debug, Clone, Copy)]
pub struct TextureArrayCodec {
    version: CodecVersion,
}

impl TextureArrayCodec {
    pub fn new(version: CodecVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> CodecVersion {
        self.version
    }

    /// Returns the record of the texture array or `None` when nothing is persisted.
    ///
    /// Texture arrays are only persisted by the full codec and when they are configured
    /// with [`SerializationMode::Export`].
    pub fn serialize(&self, texture_array: &TextureArrayAsset) -> Option<TextureArrayRecord> {
        if self.version == CodecVersion::Legacy || texture_array.config().serialization_mode == SerializationMode::Runtime {
            return None;
        }
        let raw_slices = texture_array.mipmaps();
        let record = TextureArrayRecord {
            base: texture_array.base().serialize(),
            slice: raw_slices.first().map_or(0, Vec::len) as u32,
            mipmaps: raw_slices
                .iter()
                .map(|images| images.iter().map(|image| image.key().clone()).collect())
                .collect(),
        };
        trace!("Serialized texture array '{}': {record:?}", texture_array.asset_key());
        Some(record)
    }

    /// Same as [`TextureArrayCodec::serialize`] but returns JSON
    pub fn save(&self, texture_array: &TextureArrayAsset) -> Result<Option<String>> {
        self.serialize(texture_array).map(|record| record.to_json()).transpose()
    }

    /// Restores the base state and registers a deferred reference for every image.
    ///
    /// The texture array is built from `builder` with the restored base state. It receives
    /// its images when the returned [`DeferredTextureArray`] is finished.
    pub fn deserialize(
        &self,
        json: &str,
        builder: TextureArrayAssetBuilder,
        resource_receiver: &impl ResourceReceiver,
    ) -> Result<DeferredTextureArray> {
        let mut base = BaseTextureState::default();
        let references = match self.version {
            CodecVersion::Legacy => {
                base.deserialize(&Self::legacy_base(json)?)?;
                DeferredReferences::default()
            }
            CodecVersion::Full => {
                let record = TextureArrayRecord::from_json(json)?;
                base.deserialize(&record.base)?;
                Self::register_references(&record)?
            }
        };
        let texture_array = builder.with_base_state(base).build(resource_receiver);
        info!(
            "Deserialized texture array '{}' with {} pending image references",
            texture_array.debug_info().name(),
            references.pending().len()
        );
        Ok(DeferredTextureArray {
            texture_array,
            references,
        })
    }

    fn legacy_base(json: &str) -> Result<String> {
        match serde_json::from_str::<serde_json::Value>(json)? {
            serde_json::Value::String(base) => Ok(base),
            serde_json::Value::Object(mut object) => match object.remove("base") {
                Some(serde_json::Value::String(base)) => Ok(base),
                _ => Err(Error::InvalidRecord(json.to_owned())),
            },
            _ => Err(Error::InvalidRecord(json.to_owned())),
        }
    }

    fn register_references(record: &TextureArrayRecord) -> Result<DeferredReferences<ImageAsset>> {
        let mut references = DeferredReferences::with_containers(record.mipmaps.len());
        for (level, identifiers) in record.mipmaps.iter().enumerate() {
            for slice in 0..record.slice as usize {
                let identifier = identifiers.get(slice).ok_or(Error::MissingIdentifier { level, slice })?;
                references.register(level, slice, identifier.clone(), ImageAsset::CLASS_ID)?;
            }
        }
        Ok(references)
    }
}

/// A [`TextureArrayAsset`] whose images are not resolved yet.
#[derive(Debug)]
pub struct DeferredTextureArray {
    texture_array: TextureArrayAsset,
    references: DeferredReferences<ImageAsset>,
}

impl DeferredTextureArray {
    /// Returns the image references that still have to be resolved
    pub fn pending(&self) -> &[PendingReference] {
        self.references.pending()
    }

    pub fn is_complete(&self) -> bool {
        self.references.is_complete()
    }

    /// Resolves a single reference with the given image
    pub fn resolve(&mut self, reference: &PendingReference, image: Arc<ImageAsset>) -> Result<()> {
        Ok(self.references.fulfill(reference, image)?)
    }

    /// Resolves all references whose images are tracked by the `registry` and returns their number.
    pub fn resolve_from_registry(&mut self, registry: &AssetRegistry) -> Result<usize> {
        Ok(self.references.resolve_from(registry)?)
    }

    /// Returns the texture array that is waiting for its images
    pub fn texture_array(&self) -> &TextureArrayAsset {
        &self.texture_array
    }

    /// Installs the resolved images and allocates the texture.
    pub fn finish(self) -> Result<TextureArrayAsset> {
        let raw_slices = self.references.into_containers()?;
        let mut texture_array = self.texture_array;
        texture_array.install_raw_slices(raw_slices);
        texture_array.on_loaded();
        Ok(texture_array)
    }
}
