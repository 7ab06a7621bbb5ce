//! NumPy-style strided views, slicing and fancy indexing over in-memory
//! N-dimensional arrays.
//!
//! An [`NdArray`] is a shared contiguous buffer plus a [`Layout`] (dimensions,
//! signed strides, offset). Slicing, transposing, broadcasting and direct
//! indexing all produce new arrays that alias the same buffer; writes through
//! any view are immediately visible through every other view and the root
//! array. Only explicit materialization points ([`NdArray::copy`],
//! [`NdArray::to_vec`], gather results) allocate.
//!
//! # Core Types
//!
//! - [`NdArray`]: owned-or-view array over a shared buffer
//! - [`Layout`]: dims/strides/offset description of a window into the buffer
//! - [`Slice`] / [`ResolvedSlice`]: one-axis selectors, unresolved and
//!   bound to a concrete axis length
//! - [`CoordIter`]: row-major coordinate enumeration over a shape
//!
//! # Slicing
//!
//! Selectors can be built programmatically or parsed from Python-style
//! notation (`"3"`, `"-1"`, `"start:stop:step"`, `":"`, `"..."`, `""` for a
//! new axis, comma-separated for multiple axes):
//!
//! ```rust
//! use ndview::NdArray;
//!
//! let x = NdArray::from_fn(&[2, 3], |c| (c[0] * 3 + c[1]) as i64);
//! let row = x.slice_expr("1, :").unwrap();
//! assert_eq!(row.to_vec(), vec![3, 4, 5]);
//!
//! // Views alias: writing through a slice mutates the root buffer.
//! let col = x.slice_expr(":, 0").unwrap();
//! col.set_at(&[0], 99).unwrap();
//! assert_eq!(x.to_vec(), vec![99, 1, 2, 3, 4, 5]);
//! ```
//!
//! Range bounds are forgiving (out-of-range clamps, like NumPy), while single
//! indices and index arrays are strict (out of bounds is an error):
//!
//! ```rust
//! use ndview::NdArray;
//!
//! let x = NdArray::from_vec((0..5).collect::<Vec<i64>>());
//! assert_eq!(x.slice_expr("0:77").unwrap().to_vec(), vec![0, 1, 2, 3, 4]);
//! assert!(x.at(&[77]).is_err());
//! ```
//!
//! # Fancy indexing
//!
//! Index arrays select elements ([`NdArray::gather`]) or whole subarrays, and
//! the same forms write in place ([`NdArray::scatter`]):
//!
//! ```rust
//! use ndview::NdArray;
//!
//! let y = NdArray::from_fn(&[5, 7], |c| (c[0] * 7 + c[1]) as i64);
//! let rows = NdArray::from_vec(vec![0i64, 2, 4]);
//! let cols = NdArray::from_vec(vec![0i64, 1, 2]);
//! let picked = y.gather_many(&[&rows, &cols]).unwrap();
//! assert_eq!(picked.to_vec(), vec![0, 15, 30]);
//! ```
//!
//! # Threading
//!
//! The engine is single-threaded by design: buffers are `Rc`-shared, so arrays
//! are `!Send` and cross-thread aliasing is a compile error, not a data race.

mod array;
mod broadcast;
mod coords;
mod element;
mod fancy;
mod layout;
mod slice;

// ============================================================================
// Array type and element bounds
// ============================================================================
pub use array::NdArray;
pub use element::{Element, IndexElement};

// ============================================================================
// Layout and coordinate enumeration
// ============================================================================
pub use coords::CoordIter;
pub use layout::Layout;

// ============================================================================
// Slicing
// ============================================================================
pub use slice::{parse_selection, ResolvedSlice, Slice};

// ============================================================================
// Broadcasting
// ============================================================================
pub use broadcast::{broadcast_arrays, broadcast_dims, broadcast_layout, broadcast_shapes};

// ============================================================================
// Error types
// ============================================================================

/// Errors raised by slicing, indexing and broadcasting operations.
#[derive(Debug, thiserror::Error)]
pub enum NdError {
    /// Malformed slice notation.
    #[error("invalid slice expression {expr:?}: {reason}")]
    InvalidSlice { expr: String, reason: &'static str },

    /// More than one `...` in a single selection.
    #[error("a selection may contain at most one ellipsis")]
    MultipleEllipsis,

    /// More index entries than the array has axes.
    #[error("too many indices: {given} for shape of rank {rank}")]
    TooManyIndices { given: usize, rank: usize },

    /// Single-index access out of bounds after negative normalization.
    #[error("index {index} out of bounds for axis of size {size}")]
    IndexOutOfBounds { index: i64, size: usize },

    /// Element-wise gather/scatter index outside `[0, size)`.
    #[error("flat index {index} out of bounds for array of size {size}")]
    FlatIndexOutOfBounds { index: i64, size: usize },

    /// Axis argument outside the array's rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Caller-supplied shape does not match the required one.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// Shapes cannot be broadcast to a common shape.
    #[error("operands could not be broadcast together with shapes {0:?} and {1:?}")]
    BroadcastMismatch(Vec<usize>, Vec<usize>),

    /// Element count does not match the requested shape.
    #[error("cannot reshape array of size {size} into shape {dims:?}")]
    ReshapeMismatch { size: usize, dims: Vec<usize> },

    /// A value was not representable in the target element type.
    #[error("cannot represent value as {to}")]
    CastFailure { to: &'static str },
}

/// Result type for all fallible array operations.
pub type Result<T> = std::result::Result<T, NdError>;
