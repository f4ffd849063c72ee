//! Ordo
//!
//! Batched top-k selection along any axis of an N-dimensional array, with the
//! matching gradient scatter.
//!
//! ```
//! use ordo::prelude::*;
//!
//! let input = Tensor::from_vec(vec![0.3f32, 0.2, 0.4, 0.1, 0.3, 0.2], [2, 3])?;
//! let output = ordo::topk(&input.view(), &TopKParams::new(2).axis(-1))?;
//! assert_eq!(output.indices().map(|t| t.data()), Some(&[2, 0, 1, 2][..]));
//! # Ok::<(), ordo::OrdoError>(())
//! ```
//!
//! The free functions here allocate their outputs and borrow scratch from the
//! heap. Hosts that plan memory up front use [`kernels`] directly with their
//! own [`ScratchPool`] and the inference functions in [`crate::core::resolve`].

mod ops;
pub mod prelude;

pub use ordo_core as core;
pub use ordo_cpu_kernels as kernels;

pub use ops::{argsort, sort, topk, topk_backward};
pub use ordo_core::{
    element::Element,
    error::{OrdoError, OrdoResult},
    params::{Order, ReturnMode, TopKParams, WriteMode},
    tensor::{Tensor, TensorView, TensorViewMut},
    types::{DType, Layout, Shape},
};
pub use ordo_cpu_kernels::{BoundedPool, HeapPool, ScratchPool, TopKOutput, TopKOutputsMut};
