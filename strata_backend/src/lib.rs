//! GPU facing side of the layered texture assets.
//!
//! A [`TextureArrayAsset`] reconciles the images it is given into a rectangular
//! [`MipSliceMatrix`] and tells the renderer through [`ResourceEvent`]s how the
//! texture has to be allocated and which image goes into which `(level, slice)`.
//! The [`TextureArrayCodec`] persists the asset and loads it again with deferred
//! image references.

pub mod gfx;
mod resources;

pub use resources::*;

use strata_shared::{serde_yaml, thiserror};

/// Error type for the whole library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error from the texture array: {0}")]
    TextureArray(#[from] texture_array::Error),
    #[error("Error from the texture array codec: {0}")]
    Codec(#[from] texture_array_codec::Error),
    #[error("Error from the content: {0}")]
    Content(#[from] strata_content::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
