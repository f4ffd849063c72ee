//! Numeric element types accepted by the kernels.

use crate::types::DType;
use core::{cmp::Ordering, fmt, ops::Add};
use half::{bf16, f16};
use num_traits::{One, Zero};

/// A numeric tensor element.
///
/// `total_cmp` is a total order: floats use the IEEE 754 `totalOrder`
/// predicate, so NaN sorts above every number (below when negative) and
/// `-0.0` sorts before `0.0`.
pub trait Element: Copy + Send + Sync + fmt::Debug + PartialEq + Zero + One + Add<Output = Self> + 'static {
    const DTYPE: DType;

    fn total_cmp(&self, other: &Self) -> Ordering;
}

macro_rules! impl_element_float {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                #[inline]
                fn total_cmp(&self, other: &Self) -> Ordering {
                    <$ty>::total_cmp(self, other)
                }
            }
        )*
    };
}

macro_rules! impl_element_half {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                // Widening to f32 is exact and order preserving.
                #[inline]
                fn total_cmp(&self, other: &Self) -> Ordering {
                    self.to_f32().total_cmp(&other.to_f32())
                }
            }
        )*
    };
}

macro_rules! impl_element_int {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                #[inline]
                fn total_cmp(&self, other: &Self) -> Ordering {
                    Ord::cmp(self, other)
                }
            }
        )*
    };
}

impl_element_float!(f32 => F32, f64 => F64);
impl_element_half!(f16 => F16, bf16 => BF16);
impl_element_int!(
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
);
