use crate::types::{Shape, MAX_NDIM};
use smallvec::SmallVec;

/// Memory layout of a tensor view: shape, element strides and a start offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    shape: Shape,
    strides: SmallVec<[usize; MAX_NDIM]>,
    offset: usize,
}

impl Layout {
    pub fn new(shape: &Shape, strides: &[usize], offset: usize) -> Self {
        Self {
            shape: shape.clone(),
            strides: SmallVec::from_slice(strides),
            offset,
        }
    }

    pub fn from_shape(shape: &Shape) -> Self {
        Self {
            shape: shape.clone(),
            strides: Self::compute_strides(shape.dims()),
            offset: 0,
        }
    }

    pub fn get_shape(&self) -> &Shape {
        &self.shape
    }

    pub fn get_offset(&self) -> usize {
        self.offset
    }

    pub fn get_ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn get_size(&self) -> usize {
        self.shape.size()
    }

    pub fn is_contiguous(&self) -> bool {
        let mut expected_stride = 1;
        for i in (0..self.get_ndim()).rev() {
            // Unit dimensions never move the cursor, so their stride is irrelevant.
            if self.shape[i] != 1 && self.strides[i] != expected_stride {
                return false;
            }
            expected_stride *= self.shape[i];
        }
        true
    }

    /// Storage index of the element at row-major position `linear`.
    pub fn storage_index(&self, mut linear: usize) -> usize {
        let mut index = self.offset;
        for i in (0..self.get_ndim()).rev() {
            let dim = self.shape[i];
            index += (linear % dim) * self.strides[i];
            linear /= dim;
        }
        index
    }

    /// One past the largest storage index addressed by this layout.
    pub fn storage_extent(&self) -> usize {
        if self.get_size() == 0 {
            return self.offset;
        }
        let last: usize = self
            .shape
            .dims()
            .iter()
            .zip(self.strides.iter())
            .map(|(&dim, &stride)| (dim - 1) * stride)
            .sum();
        self.offset + last + 1
    }

    pub fn compute_strides(shape: &[usize]) -> SmallVec<[usize; MAX_NDIM]> {
        let mut strides: SmallVec<[usize; MAX_NDIM]> = SmallVec::from_elem(1, shape.len());
        for i in (0..shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        strides
    }
}
