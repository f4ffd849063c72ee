//! Sort operations
//!
//! This module provides sorting operations:
//! - topk: k largest or smallest elements along an axis, returned as values,
//!   per-batch indices, a selection mask, or values and indices together
//!
//! All operations accept every [`Element`] type. Batches are sorted
//! independently, in parallel when the `rayon` feature is enabled.

use super::{
    parallel::{for_each_batch, for_each_indexed},
    permute::{batch_permutation, load_canonical, selected_permutation, AxisPermutation},
};
use crate::workspace::{ScratchPool, Workspace};
use ordo_core::{
    element::Element,
    error::{OrdoError, OrdoResult},
    params::{ReturnMode, TopKParams, WriteMode},
    resolve::BatchLayout,
    tensor::{Tensor, TensorView, TensorViewMut},
    types::Shape,
};

/// Owned result of a forward call.
///
/// Value mode keeps the indices as a hidden output; they are what
/// [`topk_backward`](super::ops_scatter::topk_backward) routes gradients with.
#[derive(Debug, Clone, PartialEq)]
pub enum TopKOutput<T> {
    Value { values: Tensor<T>, indices: Tensor<i32> },
    Indices(Tensor<i32>),
    Mask(Tensor<T>),
    Both { values: Tensor<T>, indices: Tensor<i32> },
}

impl<T> TopKOutput<T> {
    pub fn ret_typ(&self) -> ReturnMode {
        match self {
            Self::Value { .. } => ReturnMode::Value,
            Self::Indices(_) => ReturnMode::Indices,
            Self::Mask(_) => ReturnMode::Mask,
            Self::Both { .. } => ReturnMode::Both,
        }
    }

    pub fn values(&self) -> Option<&Tensor<T>> {
        match self {
            Self::Value { values, .. } | Self::Both { values, .. } => Some(values),
            Self::Indices(_) | Self::Mask(_) => None,
        }
    }

    /// Retained indices, including the hidden ones of Value mode.
    pub fn indices(&self) -> Option<&Tensor<i32>> {
        match self {
            Self::Value { indices, .. } | Self::Both { indices, .. } | Self::Indices(indices) => Some(indices),
            Self::Mask(_) => None,
        }
    }

    pub fn mask(&self) -> Option<&Tensor<T>> {
        match self {
            Self::Mask(mask) => Some(mask),
            _ => None,
        }
    }

    pub fn into_values(self) -> Option<Tensor<T>> {
        match self {
            Self::Value { values, .. } | Self::Both { values, .. } => Some(values),
            Self::Indices(_) | Self::Mask(_) => None,
        }
    }

    pub fn into_indices(self) -> Option<Tensor<i32>> {
        match self {
            Self::Value { indices, .. } | Self::Both { indices, .. } | Self::Indices(indices) => Some(indices),
            Self::Mask(_) => None,
        }
    }
}

/// Caller-provided destinations for [`topk_forward_into`].
#[derive(Debug)]
pub enum TopKOutputsMut<'a, T> {
    /// The indices buffer is optional since it is hidden from the caller.
    Value {
        values: TensorViewMut<'a, T>,
        indices: Option<TensorViewMut<'a, i32>>,
    },
    Indices(TensorViewMut<'a, i32>),
    Mask(TensorViewMut<'a, T>),
    Both {
        values: TensorViewMut<'a, T>,
        indices: TensorViewMut<'a, i32>,
    },
}

impl<T: Element> TopKOutputsMut<'_, T> {
    pub fn ret_typ(&self) -> ReturnMode {
        match self {
            Self::Value { .. } => ReturnMode::Value,
            Self::Indices(_) => ReturnMode::Indices,
            Self::Mask(_) => ReturnMode::Mask,
            Self::Both { .. } => ReturnMode::Both,
        }
    }

    fn check_shapes(&self, expected: &Shape) -> OrdoResult<()> {
        match self {
            Self::Value { values, indices } => {
                values.check_shape(expected)?;
                match indices {
                    Some(indices) => indices.check_shape(expected),
                    None => Ok(()),
                }
            },
            Self::Indices(indices) => indices.check_shape(expected),
            Self::Mask(mask) => mask.check_shape(expected),
            Self::Both { values, indices } => {
                values.check_shape(expected)?;
                indices.check_shape(expected)
            },
        }
    }
}

/// Selects the top k elements of `input` into freshly allocated outputs.
///
/// # Errors
/// Fails if the parameters do not resolve against the input shape or if the
/// scratch pool cannot lend the forward workspace.
pub fn topk_forward<T: Element>(
    input: &TensorView<'_, T>,
    params: &TopKParams,
    pool: &dyn ScratchPool,
) -> OrdoResult<TopKOutput<T>> {
    let layout = BatchLayout::resolve(input.shape(), params)?;
    let _span = forward_span(&layout).entered();

    let ws = select(input, &layout, pool)?;
    let permutation = selected_permutation(&layout);
    let permutation = permutation.as_ref();

    let output = match layout.ret_typ {
        ReturnMode::Indices => {
            let mut indices = Tensor::zeros(layout.target_shape.clone());
            write_indices(&ws, &layout, permutation, indices.view_mut().as_mut_slice());
            TopKOutput::Indices(indices)
        },
        ReturnMode::Mask => {
            let mut mask = Tensor::zeros(layout.target_shape.clone());
            write_mask(&ws, mask.view_mut().as_mut_slice());
            TopKOutput::Mask(mask)
        },
        ReturnMode::Value | ReturnMode::Both => {
            let mut values = Tensor::zeros(layout.target_shape.clone());
            let mut indices = Tensor::zeros(layout.target_shape.clone());
            write_values(&ws, &layout, permutation, values.view_mut().as_mut_slice());
            write_indices(&ws, &layout, permutation, indices.view_mut().as_mut_slice());
            if layout.ret_typ == ReturnMode::Value {
                TopKOutput::Value { values, indices }
            } else {
                TopKOutput::Both { values, indices }
            }
        },
    };
    Ok(output)
}

/// Selects the top k elements of `input` into caller-provided outputs.
///
/// Every check runs before the first write: the write request, the return
/// mode of `outputs` and the shape of every destination. `WriteMode::Null`
/// returns after validation without touching the outputs. Only
/// `WriteMode::Overwrite` writes.
pub fn topk_forward_into<T: Element>(
    input: &TensorView<'_, T>,
    params: &TopKParams,
    req: WriteMode,
    pool: &dyn ScratchPool,
    outputs: TopKOutputsMut<'_, T>,
) -> OrdoResult<()> {
    let layout = BatchLayout::resolve(input.shape(), params)?;

    if matches!(req, WriteMode::Inplace | WriteMode::Accumulate) {
        return Err(OrdoError::UnsupportedWriteMode { mode: req, op: "topk" });
    }
    if outputs.ret_typ() != layout.ret_typ {
        return Err(OrdoError::ReturnModeMismatch {
            expected: layout.ret_typ,
            got: outputs.ret_typ(),
        });
    }
    outputs.check_shapes(&layout.target_shape)?;

    if req == WriteMode::Null {
        tracing::debug!("null write request, topk outputs left untouched");
        return Ok(());
    }

    let _span = forward_span(&layout).entered();
    let ws = select(input, &layout, pool)?;
    let permutation = selected_permutation(&layout);
    let permutation = permutation.as_ref();

    match outputs {
        TopKOutputsMut::Value { mut values, indices } => {
            write_values(&ws, &layout, permutation, values.as_mut_slice());
            if let Some(mut indices) = indices {
                write_indices(&ws, &layout, permutation, indices.as_mut_slice());
            }
        },
        TopKOutputsMut::Indices(mut indices) => {
            write_indices(&ws, &layout, permutation, indices.as_mut_slice());
        },
        TopKOutputsMut::Mask(mut mask) => write_mask(&ws, mask.as_mut_slice()),
        TopKOutputsMut::Both {
            mut values,
            mut indices,
        } => {
            write_values(&ws, &layout, permutation, values.as_mut_slice());
            write_indices(&ws, &layout, permutation, indices.as_mut_slice());
        },
    }
    Ok(())
}

fn forward_span(layout: &BatchLayout) -> tracing::Span {
    tracing::debug_span!(
        "topk_forward",
        ret_typ = %layout.ret_typ,
        batch_size = layout.batch_size,
        element_num = layout.element_num,
        k = layout.k,
        transpose = layout.transpose,
    )
}

/// Sorts every batch and fills the workspace bookkeeping.
///
/// After this returns, the first k pairs of every run of `element_num` are the
/// selected elements in output order.
fn select<'p, T: Element>(
    input: &TensorView<'_, T>,
    layout: &BatchLayout,
    pool: &'p dyn ScratchPool,
) -> OrdoResult<Workspace<'p, T>> {
    let mut ws = Workspace::acquire(pool, layout)?;
    let permutation = batch_permutation(layout);
    let permutation = permutation.as_ref();
    load_canonical(input, permutation, &mut ws.pairs);

    // (value, flat index) is a total key, so ties resolve to the lowest position.
    let order = layout.order;
    for_each_batch(&mut ws.pairs, layout.element_num, |batch| {
        batch.sort_unstable_by(|a, b| order.compare(&a.0, &b.0).then(a.1.cmp(&b.1)));
    });

    let element_num = layout.element_num;
    let pairs = &ws.pairs;
    for_each_indexed(&mut ws.batch_id, |j, id| *id = pairs[j].1 / element_num);

    if layout.ret_typ == ReturnMode::Mask {
        let k = layout.k;
        for_each_indexed(&mut ws.selected, |i, position| {
            let flat = pairs[(i / k) * element_num + i % k].1;
            *position = permutation.map_or(flat, |p| p.dst_to_src(flat));
        });
    }
    Ok(ws)
}

/// Position in the sorted pairs feeding output position `o`.
#[inline]
fn sorted_position(layout: &BatchLayout, permutation: Option<&AxisPermutation>, o: usize) -> usize {
    let j = permutation.map_or(o, |p| p.src_to_dst(o));
    (j / layout.k) * layout.element_num + j % layout.k
}

fn write_values<T: Element>(
    ws: &Workspace<'_, T>,
    layout: &BatchLayout,
    permutation: Option<&AxisPermutation>,
    values: &mut [T],
) {
    let pairs = &ws.pairs;
    for_each_indexed(values, |o, slot| {
        *slot = pairs[sorted_position(layout, permutation, o)].0;
    });
}

fn write_indices<T: Element>(
    ws: &Workspace<'_, T>,
    layout: &BatchLayout,
    permutation: Option<&AxisPermutation>,
    indices: &mut [i32],
) {
    let (pairs, batch_id) = (&ws.pairs, &ws.batch_id);
    let element_num = layout.element_num;
    for_each_indexed(indices, |o, slot| {
        let src = sorted_position(layout, permutation, o);
        // element_num fits in i32, checked by the resolver
        *slot = (pairs[src].1 - batch_id[src] * element_num) as i32;
    });
}

fn write_mask<T: Element>(ws: &Workspace<'_, T>, mask: &mut [T]) {
    mask.fill(T::zero());
    for (&position, &one) in ws.selected.iter().zip(ws.fill.iter()) {
        mask[position] = one;
    }
}
