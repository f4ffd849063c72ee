use ordo_core::{
    element::Element,
    error::OrdoResult,
    params::{ReturnMode, TopKParams, WriteMode},
    resolve::BatchLayout,
    tensor::{Tensor, TensorView},
    types::Shape,
};
use ordo_cpu_kernels::{topk_forward, topk_forward_into, HeapPool, TopKOutput, TopKOutputsMut};

/// Top-k selection into freshly allocated outputs.
pub fn topk<T: Element>(input: &TensorView<'_, T>, params: &TopKParams) -> OrdoResult<TopKOutput<T>> {
    topk_forward(input, params, &HeapPool)
}

/// Sorts every batch along `axis` (`None` sorts the flattened array).
pub fn sort<T: Element>(input: &TensorView<'_, T>, axis: Option<isize>, is_ascend: bool) -> OrdoResult<Tensor<T>> {
    let params = full_selection(axis, is_ascend, ReturnMode::Value);
    let mut values = Tensor::zeros(BatchLayout::resolve(input.shape(), &params)?.target_shape);
    let outputs = TopKOutputsMut::Value {
        values: values.view_mut(),
        indices: None,
    };
    topk_forward_into(input, &params, WriteMode::Overwrite, &HeapPool, outputs)?;
    Ok(values)
}

/// Positions that sort every batch along `axis`, stable for equal values.
pub fn argsort<T: Element>(input: &TensorView<'_, T>, axis: Option<isize>, is_ascend: bool) -> OrdoResult<Tensor<i32>> {
    let params = full_selection(axis, is_ascend, ReturnMode::Indices);
    let mut indices = Tensor::zeros(BatchLayout::resolve(input.shape(), &params)?.target_shape);
    topk_forward_into(
        input,
        &params,
        WriteMode::Overwrite,
        &HeapPool,
        TopKOutputsMut::Indices(indices.view_mut()),
    )?;
    Ok(indices)
}

/// Gradient of a Value or Both selection with respect to its input.
///
/// Positions that were not selected receive zero. Return modes without a
/// gradient yield an all-zero tensor.
pub fn topk_backward<T: Element>(
    out_grad: &TensorView<'_, T>,
    indices: &TensorView<'_, i32>,
    params: &TopKParams,
    input_shape: impl Into<Shape>,
) -> OrdoResult<Tensor<T>> {
    let mut in_grad = Tensor::zeros(input_shape);
    ordo_cpu_kernels::topk_backward(
        out_grad,
        indices,
        params,
        WriteMode::Overwrite,
        &HeapPool,
        &mut in_grad.view_mut(),
    )?;
    Ok(in_grad)
}

fn full_selection(axis: Option<isize>, is_ascend: bool, ret_typ: ReturnMode) -> TopKParams {
    TopKParams {
        axis,
        k: 0,
        ret_typ,
        is_ascend,
    }
}
