//! # Overview
//!
//! Crate for the assets that textures are made of and for resolving the
//! references between them.
//!
//! Assets refer to each other by [`AssetKey`]. When a persisted record is loaded
//! the referenced assets might not be available yet, so the references are
//! collected in [`DeferredReferences`] and resolved later from an
//! [`AssetRegistry`] that tracks every loaded asset together with its [`ClassId`].
//!
//! # Example
//!
//! ```
//! use strata_content::{AssetClass, AssetKey, AssetRegistry, DeferredReferences, ImageAsset};
//!
//! let mut references = DeferredReferences::<ImageAsset>::with_containers(1);
//! references.register(0, 0, AssetKey::new("grass"), ImageAsset::CLASS_ID).unwrap();
//!
//! let registry = AssetRegistry::new();
//! registry.add(AssetKey::new("grass"), ImageAsset::default_image("grass"));
//! assert_eq!(references.resolve_from(&registry).unwrap(), 1);
//!
//! let containers = references.into_containers().unwrap();
//! assert_eq!(containers[0][0].width(), 2);
//! ```

mod asset_registry;
mod common;
mod deferred;
mod image_asset;

pub use asset_registry::*;
pub use common::*;
pub use deferred::*;
pub use image_asset::*;
