use std::sync::Arc;

use strata_content::ImageAsset;
use strata_shared::{log::trace, thiserror};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("The mipmap chain of slice {slice} has {found} levels but {expected} levels are expected")]
    RaggedChains { slice: usize, expected: usize, found: usize },
    #[error("The level {level} has {found} slices but {expected} slices are expected")]
    RaggedLevels { level: usize, expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Rectangular matrix of images indexed by `[level][slice]`.
///
/// The matrix is derived from the raw slices that the user assigns to a texture array.
/// Two layouts of raw slices are accepted:
///
/// * A single entry: every image is one slice and carries its own mipmap chain. The
///   chains are split and transposed so that level `l` holds the `l`-th image of every chain.
/// * More than one entry: entry `i` is the level `i` and every image is one slice. Only the
///   base image of every image is used.
///
/// Every row of the matrix has the same number of slices.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MipSliceMatrix {
    levels: Vec<Vec<Arc<ImageAsset>>>,
}

impl MipSliceMatrix {
    /// Builds the matrix from the raw slices. Ragged input is rejected.
    pub fn reconcile(raw_slices: &[Vec<Arc<ImageAsset>>]) -> Result<Self> {
        match raw_slices {
            [] => Ok(Self::default()),
            [slices] => Self::transpose_chains(slices),
            levels => Self::collect_base_images(levels),
        }
    }

    fn transpose_chains(slices: &[Arc<ImageAsset>]) -> Result<Self> {
        let chains = slices.iter().map(|image| image.extract_mipmaps()).collect::<Vec<_>>();
        let level_count = chains.iter().map(Vec::len).max().unwrap_or(0);
        if let Some((slice, chain)) = chains.iter().enumerate().find(|(_, chain)| chain.len() != level_count) {
            return Err(Error::RaggedChains {
                slice,
                expected: level_count,
                found: chain.len(),
            });
        }
        trace!("Transposing {} mipmap chains with {level_count} levels", chains.len());
        let levels = (0..level_count)
            .map(|level| chains.iter().map(|chain| chain[level].clone()).collect())
            .collect();
        Ok(Self { levels })
    }

    fn collect_base_images(levels: &[Vec<Arc<ImageAsset>>]) -> Result<Self> {
        let slice_count = levels[0].len();
        if let Some((level, images)) = levels.iter().enumerate().find(|(_, images)| images.len() != slice_count) {
            return Err(Error::RaggedLevels {
                level,
                expected: slice_count,
                found: images.len(),
            });
        }
        if slice_count == 0 {
            return Ok(Self::default());
        }
        trace!("Collecting the base images of {} levels with {slice_count} slices", levels.len());
        let levels = levels
            .iter()
            .map(|images| images.iter().map(|image| image.extract_base()).collect())
            .collect();
        Ok(Self { levels })
    }

    /// Returns the number of mipmap levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Returns the number of slices in every level
    pub fn slice_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns the images of all slices in the given level
    pub fn level(&self, level: usize) -> Option<&[Arc<ImageAsset>]> {
        self.levels.get(level).map(Vec::as_slice)
    }

    pub fn get(&self, level: usize, slice: usize) -> Option<&Arc<ImageAsset>> {
        self.levels.get(level)?.get(slice)
    }

    /// Returns the image at level 0 of slice 0 which determines the size and format of the texture.
    pub fn base_image(&self) -> Option<&Arc<ImageAsset>> {
        self.get(0, 0)
    }

    /// Iterates over `(level, slice, image)` level by level
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Arc<ImageAsset>)> {
        self.levels
            .iter()
            .enumerate()
            .flat_map(|(level, images)| images.iter().enumerate().map(move |(slice, image)| (level, slice, image)))
    }

    pub fn levels(&self) -> &[Vec<Arc<ImageAsset>>] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use strata_test::spectral::prelude::*;

    use crate::resources::tests::{new_dummy_chain, new_dummy_image};

    use super::*;

    fn assert_rectangular(matrix: &MipSliceMatrix) {
        for level in 0..matrix.level_count() {
            asserting("row length")
                .that(&matrix.level(level).unwrap().to_vec())
                .has_length(matrix.slice_count());
        }
    }

    fn keys(matrix: &MipSliceMatrix) -> Vec<Vec<String>> {
        matrix
            .levels()
            .iter()
            .map(|images| images.iter().map(|image| image.key().as_str().to_owned()).collect())
            .collect()
    }

    #[test]
    fn empty() {
        let matrix = MipSliceMatrix::reconcile(&[]).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.slice_count(), 0);
        assert!(matrix.base_image().is_none());
        assert_eq!(matrix.iter().count(), 0);
    }

    #[test]
    fn single_entry_without_slices() {
        let matrix = MipSliceMatrix::reconcile(&[vec![]]).unwrap();
        assert!(matrix.is_empty());
    }

    #[test]
    fn several_entries_without_slices() {
        let matrix = MipSliceMatrix::reconcile(&[vec![], vec![]]).unwrap();
        assert!(matrix.is_empty());
        assert_eq!((matrix.level_count(), matrix.slice_count()), (0, 0));
    }

    #[test]
    fn transpose_embedded_chains() {
        let raw = vec![vec![new_dummy_chain("a", 4, 3), new_dummy_chain("b", 4, 3)]];
        let matrix = MipSliceMatrix::reconcile(&raw).unwrap();
        assert_rectangular(&matrix);
        assert_eq!((matrix.level_count(), matrix.slice_count()), (3, 2));
        assert_eq!(
            keys(&matrix),
            vec![vec!["a@0", "b@0"], vec!["a@1", "b@1"], vec!["a@2", "b@2"]]
        );
        for (level, slice, image) in matrix.iter() {
            assert_eq!(image, &raw[0][slice].extract_mipmaps()[level]);
        }
    }

    #[test]
    fn single_images_without_chain() {
        let raw = vec![vec![new_dummy_image("a", 8, 8), new_dummy_image("b", 8, 8), new_dummy_image("c", 8, 8)]];
        let matrix = MipSliceMatrix::reconcile(&raw).unwrap();
        assert_eq!((matrix.level_count(), matrix.slice_count()), (1, 3));
        assert!(Arc::ptr_eq(matrix.get(0, 2).unwrap(), &raw[0][2]));
    }

    #[test]
    fn ragged_chains() {
        let raw = vec![vec![new_dummy_chain("a", 4, 3), new_dummy_chain("b", 4, 2)]];
        let result = MipSliceMatrix::reconcile(&raw);
        assert_eq!(
            result,
            Err(Error::RaggedChains {
                slice: 1,
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn levels_use_base_images_only() {
        let raw = vec![
            vec![new_dummy_chain("a0", 4, 3), new_dummy_chain("b0", 4, 3), new_dummy_image("c0", 4, 4)],
            vec![new_dummy_image("a1", 2, 2), new_dummy_chain("b1", 2, 2), new_dummy_image("c1", 2, 2)],
        ];
        let matrix = MipSliceMatrix::reconcile(&raw).unwrap();
        assert_rectangular(&matrix);
        assert_eq!((matrix.level_count(), matrix.slice_count()), (2, 3));
        for (level, slice, image) in matrix.iter() {
            assert_eq!(image, &raw[level][slice].extract_base());
        }
        assert_eq!(keys(&matrix), vec![vec!["a0@0", "b0@0", "c0"], vec!["a1", "b1@0", "c1"]]);
    }

    #[test]
    fn ragged_levels() {
        let raw = vec![
            vec![new_dummy_image("a0", 4, 4), new_dummy_image("b0", 4, 4)],
            vec![new_dummy_image("a1", 2, 2)],
        ];
        let result = MipSliceMatrix::reconcile(&raw);
        assert_eq!(
            result,
            Err(Error::RaggedLevels {
                level: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn iteration_order() {
        let raw = vec![
            vec![new_dummy_image("a0", 4, 4), new_dummy_image("b0", 4, 4)],
            vec![new_dummy_image("a1", 2, 2), new_dummy_image("b1", 2, 2)],
        ];
        let matrix = MipSliceMatrix::reconcile(&raw).unwrap();
        let order = matrix.iter().map(|(level, slice, _)| (level, slice)).collect::<Vec<_>>();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert!(matrix.get(2, 0).is_none());
        assert!(matrix.get(0, 2).is_none());
    }
}
