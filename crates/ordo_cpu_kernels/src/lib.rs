//! Ordo CPU Kernels
//!
//! CPU kernels for batched top-k selection and its gradient. Batches are
//! sorted and written in parallel with rayon when the `rayon` feature is
//! enabled; results are identical either way.

mod kernels;
pub mod workspace;

pub use kernels::*;
pub use workspace::{BoundedPool, HeapPool, ScratchLease, ScratchPool};
