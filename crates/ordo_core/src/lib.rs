//! Ordo Core
//!
//! Shared building blocks for batched top-k selection: element types, shapes,
//! layouts, tensor views, the parameter resolver and the pure shape, dtype and
//! workspace inference used by hosts that plan memory before running a kernel.

pub mod element;
pub mod error;
pub mod params;
pub mod prelude;
pub mod resolve;
pub mod tensor;
pub mod types;
