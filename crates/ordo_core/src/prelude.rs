//! Prelude module for convenient imports
//!
//! Usage: `use ordo_core::prelude::*;`

pub use crate::element::Element;
pub use crate::error::{OrdoError, OrdoResult};
pub use crate::params::{Order, ReturnMode, TopKParams, WriteMode};
pub use crate::resolve::{
    backward_workspace_len, forward_workspace_len, infer_output_count, infer_output_dtypes, infer_output_shapes,
    infer_visible_output_count, BatchLayout,
};
pub use crate::tensor::{Tensor, TensorView, TensorViewMut};
pub use crate::types::*;
