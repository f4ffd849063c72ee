use core::{fmt, ops};
use smallvec::SmallVec;

/// Highest rank accepted by the selection kernels.
pub const MAX_NDIM: usize = 5;

/// Dimensions of an array, outermost first.
///
/// Up to [`MAX_NDIM`] dimensions live inline. Longer shapes can still be built
/// so that the resolver reports them as [`InvalidShape`](crate::error::OrdoError::InvalidShape).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    dims: SmallVec<[usize; MAX_NDIM]>,
}

impl Shape {
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Number of elements.
    ///
    /// Only meaningful for shapes that describe a real buffer or that passed
    /// [`checked_size`](Self::checked_size).
    #[inline]
    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }

    /// Number of elements, or `None` if it does not fit in `usize`.
    pub fn checked_size(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }

    /// Resolves `axis` in `[-ndim, ndim)` to a position in `[0, ndim)`.
    #[inline]
    pub fn normalize_axis(&self, axis: isize) -> Option<usize> {
        let ndim = self.ndim() as isize;
        let axis = if axis < 0 { axis + ndim } else { axis };
        (0..ndim).contains(&axis).then_some(axis as usize)
    }

    /// Copy with dimension `axis` set to `size`.
    #[inline]
    pub fn with_dim(&self, axis: usize, size: usize) -> Self {
        let mut dims = self.dims.clone();
        dims[axis] = size;
        Self { dims }
    }
}

impl ops::Index<usize> for Shape {
    type Output = usize;

    #[inline]
    fn index(&self, axis: usize) -> &usize {
        &self.dims[axis]
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self {
            dims: SmallVec::from_vec(dims),
        }
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self::from(&dims[..])
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.dims.as_slice())
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_axis() {
        let shape = Shape::from([2, 3, 4]);
        assert_eq!(shape.normalize_axis(0), Some(0));
        assert_eq!(shape.normalize_axis(-1), Some(2));
        assert_eq!(shape.normalize_axis(-3), Some(0));
        assert_eq!(shape.normalize_axis(3), None);
        assert_eq!(shape.normalize_axis(-4), None);
    }

    #[test]
    fn test_checked_size() {
        assert_eq!(Shape::from([2, 3, 4]).checked_size(), Some(24));
        assert_eq!(Shape::from(Vec::new()).checked_size(), Some(1));
        assert_eq!(Shape::from([1usize << 40, 1 << 40]).checked_size(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::from([2, 3]).to_string(), "[2, 3]");
        assert_eq!(format!("{:?}", Shape::from(Vec::new())), "Shape[]");
    }
}
