pub mod ops_scatter;
pub mod ops_sort;
pub(crate) mod parallel;
pub mod permute;

pub use ops_scatter::topk_backward;
pub use ops_sort::{topk_forward, topk_forward_into, TopKOutput, TopKOutputsMut};
pub use permute::AxisPermutation;
