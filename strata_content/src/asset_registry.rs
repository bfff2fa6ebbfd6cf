use std::{any::Any, collections::BTreeMap, sync::Arc};

use strata_shared::{
    log::{info, trace},
    parking_lot::RwLock,
};

use crate::{
    common::{AssetClass, AssetKey, ClassId},
    Error, Result,
};

struct RawAsset {
    class_id: ClassId,
    value: Arc<dyn Any + Send + Sync>,
}

/// Keeps track of the assets that are loaded and can be referenced by their [`AssetKey`].
///
/// Cloning the registry is cheap and all clones share the same tracked assets, so a loader
/// running on another thread can add assets while references are being resolved.
#[derive(Clone, Default)]
pub struct AssetRegistry {
    tracked_assets: Arc<RwLock<BTreeMap<AssetKey, RawAsset>>>,
}

impl AssetRegistry {
    /// Creates a new empty `AssetRegistry`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the [`ClassId`] of the given asset type.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_content::{AssetRegistry, ImageAsset};
    /// assert_eq!(AssetRegistry::class_id::<ImageAsset>().as_str(), "strata.ImageAsset");
    /// ```
    pub fn class_id<T: AssetClass>() -> ClassId {
        T::CLASS_ID
    }

    /// Adds an asset to the tracked assets. An asset that was tracked under the same key is replaced.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_content::{AssetRegistry, ImageAsset};
    /// let registry = AssetRegistry::new();
    /// let image = ImageAsset::default_image("missing");
    /// registry.add(image.key().clone(), image.clone());
    /// assert!(registry.contains(image.key()));
    /// ```
    pub fn add<T: AssetClass>(&self, asset_key: AssetKey, value: Arc<T>) {
        info!("Tracking asset '{asset_key}' of class '{}'", T::CLASS_ID);
        let raw_asset = RawAsset {
            class_id: T::CLASS_ID,
            value,
        };
        self.tracked_assets.write().insert(asset_key, raw_asset);
    }

    /// Returns the asset with the given key when it is tracked and of class `T`.
    pub fn get<T: AssetClass>(&self, asset_key: &AssetKey) -> Option<Arc<T>> {
        self.resolve(asset_key, T::CLASS_ID).ok()
    }

    /// Returns the asset with the given key and reports why it cannot be returned otherwise.
    pub fn resolve<T: AssetClass>(&self, asset_key: &AssetKey, expected: ClassId) -> Result<Arc<T>> {
        trace!("Resolving '{asset_key}' as '{expected}'");
        let tracked_assets = self.tracked_assets.read();
        let raw_asset = tracked_assets
            .get(asset_key)
            .ok_or_else(|| Error::UnresolvedReference(asset_key.clone()))?;
        if raw_asset.class_id != expected || expected != T::CLASS_ID {
            return Err(Error::ClassMismatch {
                identifier: asset_key.clone(),
                expected,
                found: raw_asset.class_id,
            });
        }
        raw_asset
            .value
            .clone()
            .downcast::<T>()
            .map_err(|_| Error::ClassMismatch {
                identifier: asset_key.clone(),
                expected,
                found: raw_asset.class_id,
            })
    }

    /// Returns `true` if an asset with the given key is tracked.
    pub fn contains(&self, asset_key: &AssetKey) -> bool {
        self.tracked_assets.read().contains_key(asset_key)
    }

    /// Stops tracking the asset. Values that are still referenced elsewhere stay alive.
    pub fn remove(&self, asset_key: &AssetKey) -> bool {
        self.tracked_assets.write().remove(asset_key).is_some()
    }

    /// Returns the number of tracked assets.
    pub fn len(&self) -> usize {
        self.tracked_assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use crate::ImageAsset;

    use super::*;

    struct Material;

    impl AssetClass for Material {
        const CLASS_ID: ClassId = ClassId::new("strata.Material");
    }

    #[test]
    fn add_and_get() {
        let registry = AssetRegistry::new();
        assert!(registry.is_empty());
        let image = ImageAsset::default_image("grass");
        registry.add(AssetKey::new("grass"), image.clone());
        assert_eq!(registry.len(), 1);
        let resolved = registry.get::<ImageAsset>(&AssetKey::new("grass")).unwrap();
        assert!(Arc::ptr_eq(&resolved, &image));
    }

    #[test]
    fn missing_asset() {
        let registry = AssetRegistry::new();
        let result = registry.resolve::<ImageAsset>(&AssetKey::new("grass"), ImageAsset::CLASS_ID);
        assert!(matches!(result, Err(Error::UnresolvedReference(key)) if key.as_str() == "grass"));
    }

    #[test]
    fn class_mismatch() {
        let registry = AssetRegistry::new();
        registry.add(AssetKey::new("stone"), Arc::new(Material));
        assert!(registry.get::<ImageAsset>(&AssetKey::new("stone")).is_none());
        let result = registry.resolve::<ImageAsset>(&AssetKey::new("stone"), ImageAsset::CLASS_ID);
        assert!(matches!(
            result,
            Err(Error::ClassMismatch { expected, found, .. }) if expected == ImageAsset::CLASS_ID && found == Material::CLASS_ID
        ));
    }

    #[test]
    fn remove_keeps_value_alive() {
        let registry = AssetRegistry::new();
        let image = ImageAsset::default_image("grass");
        registry.add(AssetKey::new("grass"), image.clone());
        assert!(registry.remove(&AssetKey::new("grass")));
        assert!(!registry.remove(&AssetKey::new("grass")));
        assert!(!registry.contains(&AssetKey::new("grass")));
        assert_eq!(image.width(), 2);
    }

    #[test]
    fn shared_between_threads() {
        let registry = AssetRegistry::new();
        let registry2 = registry.clone();
        thread::spawn(move || registry2.add(AssetKey::new("sand"), ImageAsset::default_image("sand")))
            .join()
            .unwrap();
        assert!(registry.get::<ImageAsset>(&AssetKey::new("sand")).is_some());
    }
}
