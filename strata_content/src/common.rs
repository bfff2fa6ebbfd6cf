use std::{
    fmt::{self, Formatter},
    result,
};

use serde::{Deserialize, Serialize};
use strata_shared::{thiserror, uuid::Uuid};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The reference to '{0}' could not be resolved")]
    UnresolvedReference(AssetKey),
    #[error("The asset '{identifier}' has the class '{found}' but '{expected}' was expected")]
    ClassMismatch {
        identifier: AssetKey,
        expected: ClassId,
        found: ClassId,
    },
    #[error("The slot {slot_index} of container {container_index} does not exist")]
    InvalidSlot { container_index: usize, slot_index: usize },
    #[error("The mipmap sizes of '{identifier}' add up to {required} bytes but only {available} bytes are available")]
    InvalidMipmapLayout {
        identifier: AssetKey,
        required: usize,
        available: usize,
    },
}

/// Identifies an asset. Persisted records refer to other assets by this key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    /// Create a new [`AssetKey`] from an identifier. No validation is done on the identifier.
    ///
    /// # Example
    ///
    /// ```rust
    /// use strata_content::AssetKey;
    /// let asset_key = AssetKey::new("textures/grass.png");
    /// assert_eq!(asset_key.as_str(), "textures/grass.png");
    /// ```
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// Creates a new [`AssetKey`] from a random UUID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier of the asset.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AssetKey({})", self.0)
    }
}

impl From<&str> for AssetKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&AssetKey> for AssetKey {
    fn from(value: &AssetKey) -> Self {
        value.clone()
    }
}

/// Name under which an asset type is known to the [`AssetRegistry`](crate::AssetRegistry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(&'static str);

impl ClassId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Asset types that can be tracked by the [`AssetRegistry`](crate::AssetRegistry)
pub trait AssetClass: 'static + Send + Sync {
    const CLASS_ID: ClassId;
}

#[cfg(test)]
mod tests {
    use strata_shared::serde_json;

    use super::*;

    #[test]
    fn generated_keys_differ() {
        assert_ne!(AssetKey::generate(), AssetKey::generate());
    }

    #[test]
    fn serialized_as_plain_string() {
        let asset_key = AssetKey::new("a3f1c2");
        assert_eq!(serde_json::to_string(&asset_key).unwrap(), "\"a3f1c2\"");
        let parsed: AssetKey = serde_json::from_str("\"a3f1c2\"").unwrap();
        assert_eq!(parsed, asset_key);
    }

    #[test]
    fn display() {
        assert_eq!(AssetKey::new("grass").to_string(), "AssetKey(grass)");
        assert_eq!(ClassId::new("strata.ImageAsset").to_string(), "strata.ImageAsset");
    }
}
