//! Scatter operations
//!
//! This module provides the gradient of top-k selection:
//! - topk_backward: route the incoming gradient back to the positions the
//!   forward pass selected, overwriting or accumulating into the destination

use super::{
    parallel::for_each_indexed,
    permute::{batch_permutation, selected_permutation},
};
use crate::workspace::{GradientWorkspace, ScratchPool};
use ordo_core::{
    element::Element,
    error::{OrdoError, OrdoResult},
    params::{TopKParams, WriteMode},
    resolve::BatchLayout,
    tensor::{TensorView, TensorViewMut},
    types::Shape,
};

/// Scatters `out_grad` into `in_grad` at the positions named by `indices`.
///
/// `indices` are per-batch positions as produced by the forward pass, laid
/// out like `out_grad`. The layout is resolved from the shape of `in_grad`,
/// which is the shape of the forward input.
///
/// Return modes without a gradient (Indices, Mask) zero `in_grad` on
/// `WriteMode::Overwrite` and leave it untouched otherwise. Every shape and
/// index is validated before the first write. `WriteMode::Inplace` is
/// rejected.
pub fn topk_backward<T: Element>(
    out_grad: &TensorView<'_, T>,
    indices: &TensorView<'_, i32>,
    params: &TopKParams,
    req: WriteMode,
    pool: &dyn ScratchPool,
    in_grad: &mut TensorViewMut<'_, T>,
) -> OrdoResult<()> {
    if req == WriteMode::Inplace {
        return Err(OrdoError::UnsupportedWriteMode {
            mode: req,
            op: "topk_backward",
        });
    }

    let layout = BatchLayout::resolve(in_grad.shape(), params)?;
    let _span = tracing::debug_span!(
        "topk_backward",
        ret_typ = %layout.ret_typ,
        req = %req,
        batch_size = layout.batch_size,
        element_num = layout.element_num,
        k = layout.k,
    )
    .entered();

    if !layout.ret_typ.has_gradient() {
        tracing::debug!("return mode carries no gradient");
        if req == WriteMode::Overwrite {
            in_grad.as_mut_slice().fill(T::zero());
        }
        return Ok(());
    }

    check_shape(out_grad.shape(), &layout.target_shape)?;
    check_shape(indices.shape(), &layout.target_shape)?;
    check_indices(indices, layout.element_num)?;

    if req == WriteMode::Null {
        tracing::debug!("null write request, gradient left untouched");
        return Ok(());
    }

    let mut ws = GradientWorkspace::acquire(pool, &layout)?;
    let src_permutation = batch_permutation(&layout);
    let dst_permutation = selected_permutation(&layout);
    let (src_permutation, dst_permutation) = (src_permutation.as_ref(), dst_permutation.as_ref());

    let k = layout.k;
    let batch_shift = &ws.batch_shift;
    for_each_indexed(&mut ws.positions, |o, position| {
        let j = dst_permutation.map_or(o, |p| p.src_to_dst(o));
        let flat = indices.get(o) as usize + batch_shift[j / k];
        *position = src_permutation.map_or(flat, |p| p.dst_to_src(flat));
    });

    let in_grad = in_grad.as_mut_slice();
    match req {
        WriteMode::Overwrite => {
            in_grad.fill(T::zero());
            for (o, &position) in ws.positions.iter().enumerate() {
                in_grad[position] = out_grad.get(o);
            }
        },
        // A single pass in output order, so repeated positions sum up.
        WriteMode::Accumulate => {
            for (o, &position) in ws.positions.iter().enumerate() {
                in_grad[position] = in_grad[position] + out_grad.get(o);
            }
        },
        WriteMode::Null | WriteMode::Inplace => {},
    }
    Ok(())
}

fn check_shape(got: &Shape, expected: &Shape) -> OrdoResult<()> {
    if got != expected {
        return Err(OrdoError::ShapeMismatch {
            expected: expected.clone(),
            got: got.clone(),
        });
    }
    Ok(())
}

fn check_indices(indices: &TensorView<'_, i32>, element_num: usize) -> OrdoResult<()> {
    for o in 0..indices.size() {
        let index = indices.get(o);
        if index < 0 || index as usize >= element_num {
            return Err(OrdoError::IndexOutOfBounds {
                index: index as i64,
                bound: element_num,
            });
        }
    }
    Ok(())
}
