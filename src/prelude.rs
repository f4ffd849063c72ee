//! Prelude module for convenient imports
//!
//! Usage: `use ordo::prelude::*;`

pub use crate::ops::{argsort, sort, topk, topk_backward};
pub use ordo_core::prelude::*;
pub use ordo_cpu_kernels::{BoundedPool, HeapPool, ScratchPool, TopKOutput, TopKOutputsMut};
