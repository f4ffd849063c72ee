//! Axis permutation
//!
//! Moves the selection axis innermost so every batch becomes one contiguous
//! run, and maps flat positions back to the caller's axis order. The mapping
//! is computed from strides, so it works for any rank up to `MAX_NDIM`.

use super::parallel::for_each_indexed;
use ordo_core::{
    element::Element,
    resolve::BatchLayout,
    tensor::TensorView,
    types::{Layout, Shape, MAX_NDIM},
};
use smallvec::SmallVec;

type Dims = SmallVec<[usize; MAX_NDIM]>;

/// Explicit forward and inverse flat-index mapping of an axis permutation.
///
/// Axis `d` of the permuted ("dst") array is axis `perm[d]` of the source
/// array. Both arrays are row-major and contiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisPermutation {
    src_shape: Shape,
    dst_shape: Shape,
    perm: Dims,
    inverse: Dims,
    src_strides: Dims,
    dst_strides: Dims,
}

impl AxisPermutation {
    /// # Panics
    /// Panics if `perm` is not a permutation of `0..src_shape.ndim()`.
    pub fn new(src_shape: &Shape, perm: &[usize]) -> Self {
        let ndim = src_shape.ndim();
        assert_eq!(perm.len(), ndim, "permutation rank must match the shape rank");

        let mut inverse: Dims = SmallVec::from_elem(usize::MAX, ndim);
        for (d, &axis) in perm.iter().enumerate() {
            assert!(axis < ndim && inverse[axis] == usize::MAX, "invalid permutation {:?}", perm);
            inverse[axis] = d;
        }

        let dst_dims: Vec<usize> = perm.iter().map(|&axis| src_shape[axis]).collect();
        let dst_shape = Shape::from(dst_dims);

        Self {
            src_strides: Layout::compute_strides(src_shape.dims()),
            dst_strides: Layout::compute_strides(dst_shape.dims()),
            src_shape: src_shape.clone(),
            dst_shape,
            perm: SmallVec::from_slice(perm),
            inverse,
        }
    }

    /// Permutation that moves `axis` to the last position and keeps the other
    /// axes in order.
    pub fn to_last(src_shape: &Shape, axis: usize) -> Self {
        let perm: Dims = (0..src_shape.ndim())
            .filter(|&d| d != axis)
            .chain(core::iter::once(axis))
            .collect();
        Self::new(src_shape, &perm)
    }

    pub fn dst_shape(&self) -> &Shape {
        &self.dst_shape
    }

    pub fn is_identity(&self) -> bool {
        self.perm.iter().enumerate().all(|(d, &axis)| d == axis)
    }

    /// Source flat position of permuted flat position `flat`.
    #[inline]
    pub fn dst_to_src(&self, mut flat: usize) -> usize {
        let mut src = 0;
        for d in (0..self.dst_shape.ndim()).rev() {
            let dim = self.dst_shape[d];
            src += (flat % dim) * self.src_strides[self.perm[d]];
            flat /= dim;
        }
        src
    }

    /// Permuted flat position of source flat position `flat`.
    #[inline]
    pub fn src_to_dst(&self, mut flat: usize) -> usize {
        let mut dst = 0;
        for axis in (0..self.src_shape.ndim()).rev() {
            let dim = self.src_shape[axis];
            dst += (flat % dim) * self.dst_strides[self.inverse[axis]];
            flat /= dim;
        }
        dst
    }

    /// Writes `src` (source order) into `dst` in permuted order.
    pub fn gather<T: Copy + Send + Sync>(&self, src: &[T], dst: &mut [T]) {
        debug_assert_eq!(src.len(), self.src_shape.size());
        debug_assert_eq!(dst.len(), src.len());
        for_each_indexed(dst, |j, slot| *slot = src[self.dst_to_src(j)]);
    }

    /// Writes `src` (permuted order) into `dst` in source order.
    pub fn scatter<T: Copy + Send + Sync>(&self, src: &[T], dst: &mut [T]) {
        debug_assert_eq!(src.len(), self.dst_shape.size());
        debug_assert_eq!(dst.len(), src.len());
        for_each_indexed(dst, |i, slot| *slot = src[self.src_to_dst(i)]);
    }
}

/// Permutation that brings `layout` into batch × element order, or `None`
/// when the selection axis is already innermost (or the array is flattened).
pub fn batch_permutation(layout: &BatchLayout) -> Option<AxisPermutation> {
    match layout.axis {
        Some(axis) if layout.transpose => Some(AxisPermutation::to_last(&layout.src_shape, axis)),
        _ => None,
    }
}

/// Same permutation for arrays holding k elements on the selection axis,
/// which is how values and indices are laid out.
pub fn selected_permutation(layout: &BatchLayout) -> Option<AxisPermutation> {
    match layout.axis {
        Some(axis) if layout.transpose => Some(AxisPermutation::to_last(&layout.selected_shape(), axis)),
        _ => None,
    }
}

/// Loads `input` into `pairs` as canonical `(value, flat index)` pairs, where
/// the flat index counts positions in batch × element order.
///
/// Reads go straight through the view's layout, so strided input and the
/// transpose cost a single pass and no intermediate copy.
pub(crate) fn load_canonical<T: Element>(
    input: &TensorView<'_, T>,
    permutation: Option<&AxisPermutation>,
    pairs: &mut Vec<(T, usize)>,
) {
    let size = input.size();
    pairs.clear();
    pairs.resize(size, (T::zero(), 0));
    match permutation {
        Some(permutation) => for_each_indexed(pairs, |j, pair| *pair = (input.get(permutation.dst_to_src(j)), j)),
        None => for_each_indexed(pairs, |j, pair| *pair = (input.get(j), j)),
    }
}
