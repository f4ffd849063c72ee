//! Borrowed tensor views and the owned tensor returned to callers.

use crate::{
    element::Element,
    error::{OrdoError, OrdoResult},
    types::{DType, Layout, Shape},
};
use std::borrow::Cow;

/// Read-only view of caller-owned data described by a [`Layout`].
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a, T> {
    data: &'a [T],
    layout: &'a Layout,
}

/// Contiguous, writable view of caller-owned data.
#[derive(Debug)]
pub struct TensorViewMut<'a, T> {
    data: &'a mut [T],
    shape: Shape,
}

/// Owned, contiguous tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    data: Vec<T>,
    layout: Layout,
}

impl<'a, T: Element> TensorView<'a, T> {
    /// Wraps `data` with `layout`, checking that every addressed element is in
    /// bounds.
    pub fn new(data: &'a [T], layout: &'a Layout) -> OrdoResult<Self> {
        if layout.storage_extent() > data.len() {
            return Err(OrdoError::SizeMismatch {
                expected: layout.storage_extent(),
                got: data.len(),
            });
        }
        Ok(Self { data, layout })
    }

    pub fn shape(&self) -> &'a Shape {
        self.layout.get_shape()
    }

    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn size(&self) -> usize {
        self.layout.get_size()
    }

    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Element at row-major position `linear`.
    #[inline]
    pub fn get(&self, linear: usize) -> T {
        self.data[self.layout.storage_index(linear)]
    }

    /// Returns the elements in row-major order, borrowing when the layout is
    /// already dense.
    pub fn to_contiguous(&self) -> Cow<'a, [T]> {
        let size = self.size();
        if self.is_contiguous() {
            let offset = self.layout.get_offset();
            return Cow::Borrowed(&self.data[offset..offset + size]);
        }
        Cow::Owned((0..size).map(|i| self.data[self.layout.storage_index(i)]).collect())
    }
}

impl<'a, T: Element> TensorViewMut<'a, T> {
    pub fn new(data: &'a mut [T], shape: impl Into<Shape>) -> OrdoResult<Self> {
        let shape = shape.into();
        check_len(&shape, data.len())?;
        Ok(Self { data, shape })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn as_slice(&self) -> &[T] {
        &*self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut *self.data
    }

    /// Fails with [`OrdoError::ShapeMismatch`] unless this view has `expected` shape.
    pub fn check_shape(&self, expected: &Shape) -> OrdoResult<()> {
        if &self.shape != expected {
            return Err(OrdoError::ShapeMismatch {
                expected: expected.clone(),
                got: self.shape.clone(),
            });
        }
        Ok(())
    }
}

fn check_len(shape: &Shape, len: usize) -> OrdoResult<()> {
    let expected = shape.checked_size().ok_or_else(|| OrdoError::InvalidShape {
        shape: shape.clone(),
        reason: "element count overflows usize".to_string(),
    })?;
    if expected != len {
        return Err(OrdoError::SizeMismatch { expected, got: len });
    }
    Ok(())
}

impl<T: Element> Tensor<T> {
    pub fn from_vec(data: Vec<T>, shape: impl Into<Shape>) -> OrdoResult<Self> {
        let shape = shape.into();
        check_len(&shape, data.len())?;
        Ok(Self {
            data,
            layout: Layout::from_shape(&shape),
        })
    }

    pub fn zeros(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        Self {
            data: vec![T::zero(); shape.size()],
            layout: Layout::from_shape(&shape),
        }
    }

    pub fn shape(&self) -> &Shape {
        self.layout.get_shape()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn view(&self) -> TensorView<'_, T> {
        TensorView {
            data: &self.data,
            layout: &self.layout,
        }
    }

    pub fn view_mut(&mut self) -> TensorViewMut<'_, T> {
        TensorViewMut {
            data: &mut self.data,
            shape: self.layout.get_shape().clone(),
        }
    }
}
