use std::sync::Arc;

use strata_shared::log::{trace, warn};

use crate::{
    common::{AssetClass, AssetKey, ClassId},
    AssetRegistry, Error, Result,
};

/// A reference that was read from a persisted record but is not resolved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReference {
    pub container_index: usize,
    pub slot_index: usize,
    pub identifier: AssetKey,
    pub class_id: ClassId,
}

/// Placeholder containers that are filled once the referenced assets become available.
///
/// Loading happens in two phases. While a record is deserialized every referenced asset
/// is registered with [`DeferredReferences::register`] which reserves a slot. The loader
/// then fulfills the slots, possibly over several turns, and finally takes the containers
/// with [`DeferredReferences::into_containers`], which fails if a slot is still empty.
#[derive(Debug)]
pub struct DeferredReferences<T> {
    containers: Vec<Vec<Option<Arc<T>>>>,
    pending: Vec<PendingReference>,
}

impl<T> Default for DeferredReferences<T> {
    fn default() -> Self {
        Self {
            containers: Vec::new(),
            pending: Vec::new(),
        }
    }
}

impl<T: AssetClass> DeferredReferences<T> {
    /// Creates `container_count` empty containers.
    pub fn with_containers(container_count: usize) -> Self {
        Self {
            containers: vec![Vec::new(); container_count],
            ..Default::default()
        }
    }

    /// Returns the number of containers.
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Reserves the slot `slot_index` in the container `container_index` for the asset `identifier`.
    pub fn register(&mut self, container_index: usize, slot_index: usize, identifier: AssetKey, class_id: ClassId) -> Result<()> {
        let container = self
            .containers
            .get_mut(container_index)
            .ok_or(Error::InvalidSlot {
                container_index,
                slot_index,
            })?;
        if container.len() <= slot_index {
            container.resize(slot_index + 1, None);
        }
        trace!("Registered deferred reference to '{identifier}' at [{container_index}][{slot_index}]");
        self.pending.push(PendingReference {
            container_index,
            slot_index,
            identifier,
            class_id,
        });
        Ok(())
    }

    /// Returns the references that are not fulfilled yet.
    pub fn pending(&self) -> &[PendingReference] {
        &self.pending
    }

    /// Returns `true` when every registered reference is fulfilled.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Places `value` in the slot of the given pending reference.
    pub fn fulfill(&mut self, reference: &PendingReference, value: Arc<T>) -> Result<()> {
        let position = self
            .pending
            .iter()
            .position(|pending| pending == reference)
            .ok_or(Error::InvalidSlot {
                container_index: reference.container_index,
                slot_index: reference.slot_index,
            })?;
        let reference = self.pending.swap_remove(position);
        self.containers[reference.container_index][reference.slot_index] = Some(value);
        Ok(())
    }

    /// Fulfills every pending reference whose asset is tracked by the `registry` and returns
    /// how many were fulfilled. References to assets that are not available yet stay pending.
    pub fn resolve_from(&mut self, registry: &AssetRegistry) -> Result<usize> {
        let mut still_pending = Vec::new();
        let mut resolved = 0;
        let mut references = std::mem::take(&mut self.pending).into_iter();
        while let Some(reference) = references.next() {
            match registry.resolve::<T>(&reference.identifier, reference.class_id) {
                Ok(value) => {
                    self.containers[reference.container_index][reference.slot_index] = Some(value);
                    resolved += 1;
                }
                Err(Error::UnresolvedReference(_)) => still_pending.push(reference),
                Err(err) => {
                    // The references that were not visited stay pending as well
                    still_pending.push(reference);
                    still_pending.extend(references);
                    self.pending = still_pending;
                    return Err(err);
                }
            }
        }
        self.pending = still_pending;
        Ok(resolved)
    }

    /// Returns the filled containers.
    ///
    /// A partially resolved set is a failure of the loader, so the first unresolved reference
    /// is reported as [`Error::UnresolvedReference`].
    pub fn into_containers(self) -> Result<Vec<Vec<Arc<T>>>> {
        if let Some(reference) = self.pending.first() {
            warn!("{} references are still pending", self.pending.len());
            return Err(Error::UnresolvedReference(reference.identifier.clone()));
        }
        self.containers
            .into_iter()
            .enumerate()
            .map(|(container_index, container)| {
                container
                    .into_iter()
                    .enumerate()
                    .map(|(slot_index, slot)| {
                        slot.ok_or(Error::InvalidSlot {
                            container_index,
                            slot_index,
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use strata_test::spectral::prelude::*;

    use crate::ImageAsset;

    use super::*;

    fn registered(keys: &[&[&str]]) -> DeferredReferences<ImageAsset> {
        let mut references = DeferredReferences::with_containers(keys.len());
        for (container_index, container) in keys.iter().enumerate() {
            for (slot_index, key) in container.iter().enumerate() {
                references
                    .register(container_index, slot_index, AssetKey::new(*key), ImageAsset::CLASS_ID)
                    .unwrap();
            }
        }
        references
    }

    #[test]
    fn resolve_in_two_turns() {
        let registry = AssetRegistry::new();
        let mut references = registered(&[&["a", "b"], &["c", "d"]]);
        assert_that!(references.pending().to_vec()).has_length(4);

        registry.add(AssetKey::new("a"), ImageAsset::default_image("a"));
        registry.add(AssetKey::new("d"), ImageAsset::default_image("d"));
        assert_eq!(references.resolve_from(&registry).unwrap(), 2);
        assert!(!references.is_complete());

        registry.add(AssetKey::new("b"), ImageAsset::default_image("b"));
        registry.add(AssetKey::new("c"), ImageAsset::default_image("c"));
        assert_eq!(references.resolve_from(&registry).unwrap(), 2);
        assert!(references.is_complete());

        let containers = references.into_containers().unwrap();
        let keys = containers
            .iter()
            .map(|container| container.iter().map(|image| image.key().as_str().to_owned()).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn fulfill_manually() {
        let mut references = registered(&[&["a"]]);
        let reference = references.pending()[0].clone();
        references.fulfill(&reference, ImageAsset::default_image("a")).unwrap();
        assert!(references.fulfill(&reference, ImageAsset::default_image("a")).is_err());
        assert_eq!(references.into_containers().unwrap()[0][0].key().as_str(), "a");
    }

    #[test]
    fn partially_resolved_is_an_error() {
        let registry = AssetRegistry::new();
        registry.add(AssetKey::new("a"), ImageAsset::default_image("a"));
        let mut references = registered(&[&["a", "b"]]);
        references.resolve_from(&registry).unwrap();
        let result = references.into_containers();
        assert!(matches!(result, Err(Error::UnresolvedReference(key)) if key.as_str() == "b"));
    }

    #[test]
    fn register_in_unknown_container() {
        let mut references = DeferredReferences::<ImageAsset>::with_containers(1);
        let result = references.register(1, 0, AssetKey::new("a"), ImageAsset::CLASS_ID);
        assert!(matches!(result, Err(Error::InvalidSlot { container_index: 1, .. })));
    }

    #[test]
    fn empty_containers_are_kept() {
        let references = DeferredReferences::<ImageAsset>::with_containers(2);
        assert!(references.is_complete());
        let containers = references.into_containers().unwrap();
        assert_eq!(containers.len(), 2);
        assert!(containers.iter().all(|container| container.is_empty()));
    }
}
