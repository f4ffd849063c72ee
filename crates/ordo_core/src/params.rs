//! Operator parameters for top-k selection and its gradient.

use crate::{
    element::Element,
    error::{OrdoError, OrdoResult},
};
use core::{cmp::Ordering, fmt, str::FromStr};

/// What the forward pass returns.
///
/// The same variant drives output arity, output shapes and dtypes, and both
/// the forward encoding and the backward behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ReturnMode {
    /// The top k values.
    Value,
    /// Per-batch positions of the top k values.
    #[default]
    Indices,
    /// Full-size array holding 1 at selected positions and 0 elsewhere.
    Mask,
    /// Values and indices as two outputs.
    Both,
}

impl ReturnMode {
    /// Number of outputs the forward pass produces, including hidden ones.
    ///
    /// Value mode keeps the indices as a hidden second output so the
    /// backward pass can route gradients.
    pub fn num_outputs(&self) -> usize {
        match self {
            Self::Indices | Self::Mask => 1,
            Self::Value | Self::Both => 2,
        }
    }

    /// Number of outputs visible to the caller.
    pub fn num_visible_outputs(&self) -> usize {
        match self {
            Self::Both => 2,
            Self::Value | Self::Indices | Self::Mask => 1,
        }
    }

    /// Whether gradients flow back through this mode.
    pub fn has_gradient(&self) -> bool {
        matches!(self, Self::Value | Self::Both)
    }
}

impl fmt::Display for ReturnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Value => "value",
            Self::Indices => "indices",
            Self::Mask => "mask",
            Self::Both => "both",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ReturnMode {
    type Err = OrdoError;

    fn from_str(s: &str) -> OrdoResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "value" => Ok(Self::Value),
            "indices" => Ok(Self::Indices),
            "mask" => Ok(Self::Mask),
            "both" => Ok(Self::Both),
            _ => Err(OrdoError::UnknownReturnMode(s.to_string())),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    /// Compares two elements so that the preferred one sorts first.
    #[inline]
    pub fn compare<T: Element>(&self, a: &T, b: &T) -> Ordering {
        match self {
            Self::Ascending => a.total_cmp(b),
            Self::Descending => b.total_cmp(a),
        }
    }
}

/// Destination write request, as issued by a host graph executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WriteMode {
    /// Nothing is requested; the destination must not be touched.
    Null,
    /// Replace the destination contents.
    #[default]
    Overwrite,
    /// Write into the buffer that also holds an input.
    Inplace,
    /// Add into the existing destination contents.
    Accumulate,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Null => "null",
            Self::Overwrite => "write",
            Self::Inplace => "inplace",
            Self::Accumulate => "add",
        };
        write!(f, "{s}")
    }
}

impl FromStr for WriteMode {
    type Err = OrdoError;

    fn from_str(s: &str) -> OrdoResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "null" => Ok(Self::Null),
            "write" | "overwrite" => Ok(Self::Overwrite),
            "inplace" => Ok(Self::Inplace),
            "add" | "accumulate" => Ok(Self::Accumulate),
            _ => Err(OrdoError::UnknownWriteMode(s.to_string())),
        }
    }
}

/// Top-k parameters.
///
/// * `axis` - Axis to select along (negative values count from the end).
///   `None` treats the flattened array as a single batch.
/// * `k` - Number of elements to keep per batch. `k <= 0` keeps every
///   element, which amounts to a full sort of each batch.
/// * `ret_typ` - What the forward pass returns.
/// * `is_ascend` - Select the k smallest instead of the k largest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TopKParams {
    pub axis: Option<isize>,
    pub k: isize,
    pub ret_typ: ReturnMode,
    pub is_ascend: bool,
}

impl Default for TopKParams {
    fn default() -> Self {
        Self {
            axis: None,
            k: 1,
            ret_typ: ReturnMode::Indices,
            is_ascend: false,
        }
    }
}

impl TopKParams {
    pub fn new(k: isize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }

    pub fn axis(mut self, axis: isize) -> Self {
        self.axis = Some(axis);
        self
    }

    pub fn flatten(mut self) -> Self {
        self.axis = None;
        self
    }

    pub fn ret_typ(mut self, ret_typ: ReturnMode) -> Self {
        self.ret_typ = ret_typ;
        self
    }

    pub fn ascending(mut self, is_ascend: bool) -> Self {
        self.is_ascend = is_ascend;
        self
    }

    pub fn order(&self) -> Order {
        if self.is_ascend {
            Order::Ascending
        } else {
            Order::Descending
        }
    }
}
