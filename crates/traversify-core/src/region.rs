//! Pixel regions produced by the rasterizer and region grower.

use crate::pixels::{Dimensions, PixelCoord};

/// A set of pixel coordinates, all inside `bounds`.
///
/// Stored as sorted, de-duplicated flat buffer indices. Iteration is
/// row-major and duplicate inserts are absorbed, so the union of overlapping
/// brush stamps touches each pixel once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelRegion {
    bounds: Dimensions,
    indices: Vec<usize>,
}

impl PixelRegion {
    /// Create an empty region for an image of the given size.
    pub fn new(bounds: Dimensions) -> Self {
        Self {
            bounds,
            indices: Vec::new(),
        }
    }

    /// Build a region from arbitrary coordinates, dropping any out of bounds.
    pub fn from_coords(bounds: Dimensions, coords: impl IntoIterator<Item = PixelCoord>) -> Self {
        let indices = coords
            .into_iter()
            .filter(|&c| bounds.contains(c))
            .map(|c| bounds.index_of(c))
            .collect();
        Self::from_indices(bounds, indices)
    }

    /// Build a region from flat buffer indices, dropping any past the end.
    pub fn from_indices(bounds: Dimensions, mut indices: Vec<usize>) -> Self {
        let count = bounds.pixel_count();
        indices.retain(|&i| i < count);
        indices.sort_unstable();
        indices.dedup();
        Self { bounds, indices }
    }

    /// Build a region from a per-pixel mask in row-major order.
    ///
    /// Linear in the mask length; entries past the image are ignored.
    pub fn from_mask(bounds: Dimensions, mask: &[bool]) -> Self {
        let indices = mask
            .iter()
            .take(bounds.pixel_count())
            .enumerate()
            .filter_map(|(i, &set)| set.then_some(i))
            .collect();
        Self { bounds, indices }
    }

    pub fn bounds(&self) -> Dimensions {
        self.bounds
    }

    /// Add a coordinate. Returns false if it was out of bounds or already present.
    pub fn insert(&mut self, coord: PixelCoord) -> bool {
        self.bounds.contains(coord) && self.insert_index(self.bounds.index_of(coord))
    }

    /// Add a signed coordinate, ignoring anything off the image.
    pub fn insert_signed(&mut self, x: i64, y: i64) -> bool {
        if !self.bounds.contains_signed(x, y) {
            return false;
        }
        self.insert(PixelCoord::new(x as u32, y as u32))
    }

    fn insert_index(&mut self, index: usize) -> bool {
        match self.indices.binary_search(&index) {
            Ok(_) => false,
            Err(at) => {
                self.indices.insert(at, index);
                true
            }
        }
    }

    pub fn contains(&self, coord: PixelCoord) -> bool {
        self.bounds.contains(coord) && self.indices.binary_search(&self.bounds.index_of(coord)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PixelCoord> + '_ {
        let bounds = self.bounds;
        self.indices.iter().map(move |&i| bounds.coord_of(i))
    }

    /// Flat buffer indices of every coordinate, row-major.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Merge another region into this one.
    pub fn union_with(&mut self, other: &PixelRegion) {
        if other.is_empty() {
            return;
        }
        let (a, b) = (&self.indices, &other.indices);
        let mut merged = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if a[i] < b[j] {
                merged.push(a[i]);
                i += 1;
            } else if b[j] < a[i] {
                merged.push(b[j]);
                j += 1;
            } else {
                merged.push(a[i]);
                i += 1;
                j += 1;
            }
        }
        merged.extend_from_slice(&a[i..]);
        merged.extend_from_slice(&b[j..]);
        self.indices = merged;
    }

    /// Coordinates of this region that are not in `other`.
    pub fn difference(&self, other: &PixelRegion) -> PixelRegion {
        let mut rest = other.indices.iter().peekable();
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&i| {
                while rest.next_if(|&&o| o < i).is_some() {}
                rest.peek().is_none_or(|&&o| o != i)
            })
            .collect();
        Self {
            bounds: self.bounds,
            indices,
        }
    }
}

impl Extend<PixelCoord> for PixelRegion {
    fn extend<T: IntoIterator<Item = PixelCoord>>(&mut self, iter: T) {
        let added = PixelRegion::from_coords(self.bounds, iter);
        self.union_with(&added);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_out_of_bounds() {
        let mut region = PixelRegion::new(Dimensions::new(4, 4));
        assert!(region.insert(PixelCoord::new(3, 3)));
        assert!(!region.insert(PixelCoord::new(4, 0)));
        assert!(!region.insert_signed(-1, 2));
        assert_eq!(region.len(), 1);
    }

    #[test]
    fn test_duplicates_absorbed() {
        let mut region = PixelRegion::new(Dimensions::new(4, 4));
        assert!(region.insert(PixelCoord::new(1, 1)));
        assert!(!region.insert(PixelCoord::new(1, 1)));
        assert_eq!(region.len(), 1);
    }

    #[test]
    fn test_union_and_indices() {
        let dims = Dimensions::new(3, 3);
        let mut a = PixelRegion::from_coords(dims, [PixelCoord::new(0, 0), PixelCoord::new(2, 1)]);
        let b = PixelRegion::from_coords(dims, [PixelCoord::new(2, 1), PixelCoord::new(1, 2)]);
        a.union_with(&b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.indices().collect::<Vec<_>>(), vec![0, 5, 7]);
    }

    #[test]
    fn test_unordered_input_iterates_row_major() {
        let dims = Dimensions::new(4, 4);
        let region = PixelRegion::from_indices(dims, vec![9, 2, 15, 2, 16, 0]);
        assert_eq!(region.indices().collect::<Vec<_>>(), vec![0, 2, 9, 15]);
        assert_eq!(region.iter().next(), Some(PixelCoord::new(0, 0)));
        assert!(region.contains(PixelCoord::new(1, 2)));
        assert!(!region.contains(PixelCoord::new(1, 1)));
    }

    #[test]
    fn test_from_mask() {
        let dims = Dimensions::new(2, 2);
        let region = PixelRegion::from_mask(dims, &[false, true, true, false, true]);
        assert_eq!(region.indices().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_difference() {
        let dims = Dimensions::new(4, 1);
        let all = PixelRegion::from_indices(dims, vec![0, 1, 2, 3]);
        let some = PixelRegion::from_indices(dims, vec![1, 3]);
        assert_eq!(all.difference(&some).indices().collect::<Vec<_>>(), vec![0, 2]);
        assert!(some.difference(&all).is_empty());
    }
}
