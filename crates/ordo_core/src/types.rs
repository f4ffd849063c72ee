mod dtype;
mod layout;
mod shape;

pub use dtype::DType;
pub use layout::Layout;
pub use shape::{Shape, MAX_NDIM};
