use crate::{
    params::{ReturnMode, WriteMode},
    types::Shape,
};
use thiserror::Error;

/// Main error type for ordo.
///
/// Every variant is raised during validation, before any output buffer is
/// written, so a failed call never leaves a destination half-updated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrdoError {
    // ===== Parameter Errors =====
    /// Axis outside `[-ndim, ndim)`.
    #[error("invalid axis {axis}: expected a value in [-{ndim}, {ndim})")]
    InvalidAxis { axis: isize, ndim: usize },
    /// k resolved outside `[1, element_num]`.
    #[error("k must be in [1, {element_num}], got k = {k}")]
    InvalidK { k: isize, element_num: usize },
    /// Return mode name that does not match any mode.
    #[error("unknown return mode {0:?}, expected one of value, indices, mask, both")]
    UnknownReturnMode(String),
    /// Write mode name that does not match any mode.
    #[error("unknown write mode {0:?}, expected one of null, write, inplace, add")]
    UnknownWriteMode(String),

    // ===== Shape and Layout Errors =====
    /// Shape rejected by the resolver.
    #[error("invalid shape {shape}: {reason}")]
    InvalidShape { shape: Shape, reason: String },
    /// Buffer shape disagrees with the inferred shape.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },
    /// Buffer length disagrees with the element count of its shape.
    #[error("size mismatch: expected {expected} elements, got {got}")]
    SizeMismatch { expected: usize, got: usize },
    /// Output buffers supplied for a different return mode.
    #[error("outputs supplied for return mode {got}, but params request {expected}")]
    ReturnModeMismatch { expected: ReturnMode, got: ReturnMode },

    // ===== Index Errors =====
    /// Retained index outside the batch it addresses.
    #[error("index {index} out of bounds for axis of size {bound}")]
    IndexOutOfBounds { index: i64, bound: usize },
    /// Axis too long to express positions as `i32`.
    #[error("axis of size {element_num} cannot be indexed with i32")]
    IndexOverflow { element_num: usize },

    // ===== Execution Errors =====
    /// Write request the kernel does not implement.
    #[error("unsupported write mode {mode} for {op}")]
    UnsupportedWriteMode { mode: WriteMode, op: &'static str },
    /// Scratch pool cannot satisfy the request.
    #[error("scratch exhausted: requested {requested} elements, {available} available")]
    ScratchExhausted { requested: usize, available: usize },
}

/// Result type alias for ordo operations.
pub type OrdoResult<T> = Result<T, OrdoError>;
