//! Parameter resolution and pure shape inference.
//!
//! [`BatchLayout::resolve`] turns a source shape and [`TopKParams`] into the
//! batch × element view the kernels operate on. It is recomputed on every
//! forward and backward call; nothing is cached between calls.

use crate::{
    error::{OrdoError, OrdoResult},
    params::{Order, ReturnMode, TopKParams},
    types::{DType, Shape, MAX_NDIM},
};

/// Resolved batch × element view of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLayout {
    /// Shape of the array being selected from.
    pub src_shape: Shape,
    /// Normalized selection axis, `None` when the array is flattened.
    pub axis: Option<usize>,
    /// Number of independent batches.
    pub batch_size: usize,
    /// Number of elements in each batch.
    pub element_num: usize,
    /// Effective k after substituting `k <= 0` with `element_num`.
    pub k: usize,
    /// Whether the axis has to be moved innermost before selecting.
    pub transpose: bool,
    /// Shape of the primary output.
    pub target_shape: Shape,
    pub order: Order,
    pub ret_typ: ReturnMode,
}

impl BatchLayout {
    pub fn resolve(shape: &Shape, params: &TopKParams) -> OrdoResult<Self> {
        validate_shape(shape)?;

        let (axis, batch_size, element_num, transpose) = match params.axis {
            None => (None, 1, shape.size(), false),
            Some(requested) => {
                let axis = shape.normalize_axis(requested).ok_or(OrdoError::InvalidAxis {
                    axis: requested,
                    ndim: shape.ndim(),
                })?;
                let element_num = shape[axis];
                (Some(axis), shape.size() / element_num, element_num, axis != shape.ndim() - 1)
            },
        };

        let k = if params.k <= 0 { element_num } else { params.k as usize };
        if k < 1 || k > element_num {
            return Err(OrdoError::InvalidK { k: params.k, element_num });
        }

        if element_num > i32::MAX as usize {
            return Err(OrdoError::IndexOverflow { element_num });
        }

        let target_shape = match (axis, params.ret_typ) {
            (_, ReturnMode::Mask) => shape.clone(),
            (None, _) => Shape::from([k]),
            (Some(axis), _) => shape.with_dim(axis, k),
        };

        let layout = Self {
            src_shape: shape.clone(),
            axis,
            batch_size,
            element_num,
            k,
            transpose,
            target_shape,
            order: params.order(),
            ret_typ: params.ret_typ,
        };
        tracing::trace!(
            src_shape = %layout.src_shape,
            batch_size,
            element_num,
            k,
            transpose,
            "resolved top-k layout"
        );
        Ok(layout)
    }

    /// Total number of elements in the source array.
    pub fn size(&self) -> usize {
        self.batch_size * self.element_num
    }

    /// Number of selected elements across all batches.
    pub fn selected_len(&self) -> usize {
        self.batch_size * self.k
    }

    /// Shape of the selected block in source axis order, with k on the axis.
    ///
    /// This is the layout of values and indices regardless of the return
    /// mode, which is what the gradient is routed through.
    pub fn selected_shape(&self) -> Shape {
        match self.axis {
            None => Shape::from([self.k]),
            Some(axis) => self.src_shape.with_dim(axis, self.k),
        }
    }
}

const MAX_SCRATCH_PER_ELEMENT: usize = 5;

fn validate_shape(shape: &Shape) -> OrdoResult<()> {
    if shape.ndim() > MAX_NDIM {
        return Err(OrdoError::InvalidShape {
            shape: shape.clone(),
            reason: format!("rank {} exceeds the maximum of {}", shape.ndim(), MAX_NDIM),
        });
    }
    if shape.dims().iter().any(|&dim| dim == 0) {
        return Err(OrdoError::InvalidShape {
            shape: shape.clone(),
            reason: "dimensions must be positive".to_string(),
        });
    }
    // The forward workspace needs at most 5 elements per source element.
    let size = shape.checked_size().ok_or_else(|| OrdoError::InvalidShape {
        shape: shape.clone(),
        reason: "element count overflows usize".to_string(),
    })?;
    if size.checked_mul(MAX_SCRATCH_PER_ELEMENT).is_none() {
        return Err(OrdoError::InvalidShape {
            shape: shape.clone(),
            reason: "scratch size overflows usize".to_string(),
        });
    }
    Ok(())
}

/// Shapes of every forward output, hidden ones included.
pub fn infer_output_shapes(shape: &Shape, params: &TopKParams) -> OrdoResult<Vec<Shape>> {
    let layout = BatchLayout::resolve(shape, params)?;
    Ok(vec![layout.target_shape; params.ret_typ.num_outputs()])
}

pub fn infer_output_count(params: &TopKParams) -> usize {
    params.ret_typ.num_outputs()
}

pub fn infer_visible_output_count(params: &TopKParams) -> usize {
    params.ret_typ.num_visible_outputs()
}

/// Dtypes of every forward output. Indices are always `i32`.
pub fn infer_output_dtypes(dtype: DType, params: &TopKParams) -> Vec<DType> {
    match params.ret_typ {
        ReturnMode::Value | ReturnMode::Both => vec![dtype, DType::I32],
        ReturnMode::Indices => vec![DType::I32],
        ReturnMode::Mask => vec![dtype],
    }
}

/// Scratch elements needed by a forward call: sorted values, flat indices and
/// batch ids for every element, plus selected positions and fill values for
/// every selected element in mask mode.
pub fn forward_workspace_len(shape: &Shape, params: &TopKParams) -> OrdoResult<usize> {
    let layout = BatchLayout::resolve(shape, params)?;
    Ok(forward_workspace_len_for(&layout))
}

pub fn forward_workspace_len_for(layout: &BatchLayout) -> usize {
    let base = 3 * layout.size();
    match layout.ret_typ {
        ReturnMode::Mask => base + 2 * layout.selected_len(),
        _ => base,
    }
}

/// Scratch elements needed by a backward call: one absolute position per
/// selected element plus one shift per batch. Modes without a gradient need
/// none.
pub fn backward_workspace_len(shape: &Shape, params: &TopKParams) -> OrdoResult<usize> {
    let layout = BatchLayout::resolve(shape, params)?;
    Ok(backward_workspace_len_for(&layout))
}

pub fn backward_workspace_len_for(layout: &BatchLayout) -> usize {
    if layout.ret_typ.has_gradient() {
        layout.selected_len() + layout.batch_size
    } else {
        0
    }
}
