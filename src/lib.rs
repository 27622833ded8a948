//! NumPy-style strided n-dimensional arrays with broadcasting and dense linear
//! algebra written from first principles.
//!
//! # Core Types
//!
//! - [`NdArray`]: a shape/strides/offset descriptor over a reference-counted
//!   element buffer. Views produced by [`NdArray::reshape`], [`NdArray::permute`],
//!   [`NdArray::expand_dims`], [`NdArray::index_axis`] and [`broadcast_to`] share
//!   the buffer with their source; writes through one view are visible through
//!   every alias.
//! - [`Element`] / [`Scalar`] / [`FloatScalar`]: trait bounds for storable,
//!   arithmetic and floating-point element types.
//!
//! # Primary API
//!
//! ## Shapes and strides
//!
//! - [`total_size`], [`compute_strides`], [`flatten_index`], [`unravel_index`]
//! - Constructors: [`eye`], [`arange`], [`linspace`], [`diag`]
//!
//! ## Broadcasting
//!
//! - [`broadcast_shapes`]: NumPy shape promotion
//! - [`broadcast_to`]: zero-copy expansion of size-1 axes (stride 0)
//!
//! ## Elementwise operations
//!
//! - [`zip_map`], [`try_zip_map`], [`map`]: generic traversal with broadcasting
//! - [`add`], [`subtract`], [`multiply`], [`divide`], comparisons, logical ops,
//!   [`clip`], [`where_cond`]
//! - Unary float math in [`math`]
//!
//! ## Reductions
//!
//! - [`reduce`], [`reduce_axis`], [`sum`], [`min`], [`max`], [`mean`] and friends
//!
//! ## Linear algebra
//!
//! - [`linalg::matmul`], [`linalg::trace`], [`linalg::norm`], [`linalg::det`],
//!   [`linalg::inverse`], [`linalg::eig`], [`linalg::svd`]
//! - Iterative solvers report convergence through [`linalg::SolverReport`]
//!
//! # Example
//!
//! ```rust
//! use strided_nd::{linalg, NdArray};
//!
//! let a = NdArray::from_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//! let b = NdArray::from_vec(&[3, 2], vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
//!
//! let c = linalg::matmul(&a, &b).unwrap();
//! assert_eq!(c.to_vec(), vec![58.0, 64.0, 139.0, 154.0]);
//!
//! // Transpose is a view: no data moves.
//! let at = a.t();
//! assert_eq!(at.shape(), &[3, 2]);
//! assert!(at.shares_buffer(&a));
//! ```
//!
//! # Broadcasting Example
//!
//! ```rust
//! use strided_nd::{add, NdArray};
//!
//! let m = NdArray::from_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
//! let row = NdArray::from_vec(&[3], vec![10.0, 20.0, 30.0]).unwrap();
//!
//! let out = add(&m, &row).unwrap();
//! assert_eq!(out.to_vec(), vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
//! ```

mod array;
pub mod broadcast;
pub mod creation;
mod kernel;
pub mod linalg;
pub mod math;
mod maybe_sync;
pub mod ops;
mod reduce;
mod scalar;
pub mod shape;

// ============================================================================
// Array types
// ============================================================================
pub use array::{Iter, NdArray};
pub use scalar::{Element, FloatScalar, Scalar, Truthy};

// ============================================================================
// Shapes and strides
// ============================================================================
pub use shape::{
    compute_strides, flatten_index, ravel_multi_index, total_size, unravel_index, validate_shape,
};

// ============================================================================
// Constructors
// ============================================================================
pub use creation::{arange, diag, eye, identity, linspace, vander};

// ============================================================================
// Broadcasting
// ============================================================================
pub use broadcast::{broadcast_pair, broadcast_shapes, broadcast_shapes3, broadcast_to, can_broadcast};

// ============================================================================
// Elementwise operations
// ============================================================================
pub use ops::{
    add, add_scalar, clip, clip_scalar, divide, divide_scalar, equal, greater, greater_equal,
    less, less_equal, logical_and, logical_not, logical_or, logical_xor, map, multiply,
    multiply_scalar, negate, not_equal, scalar_divide, scalar_subtract, subtract,
    subtract_scalar, try_map, try_zip_map, where_cond, zip_map, zip_map3,
};

// ============================================================================
// Reductions
// ============================================================================
pub use reduce::{
    all, any, argmax, argmin, cumprod, cumsum, max, max_axis, mean, mean_axis, min, min_axis,
    product, reduce, reduce_axis, sum, sum_axis,
};

pub use maybe_sync::{MaybeSend, MaybeSendSync, MaybeSync};

// ============================================================================
// Constants
// ============================================================================

/// Pivot magnitude below which elimination treats a matrix as singular.
///
/// [`linalg::det`] returns exactly zero and [`linalg::inverse`] fails with
/// [`ArrayError::SingularMatrix`] once a pivot falls under this bound.
pub const PIVOT_TOLERANCE: f64 = 1e-10;

/// Default sweep cap for the iterative eigen/SVD solvers.
pub const DEFAULT_MAX_ITER: usize = 1000;

/// Default off-diagonal residual below which the iterative solvers stop.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Minimum number of output elements before the `parallel` feature hands a
/// loop to rayon.
pub const MIN_PARALLEL_LEN: usize = 1 << 15;

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur during array operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArrayError {
    /// Shape is empty or contains a zero-length dimension.
    #[error("invalid shape {0:?}: dimensions must be non-empty and positive")]
    InvalidShape(Vec<usize>),

    /// Element counts disagree (wrap or reshape).
    #[error("size mismatch: expected {expected} elements, got {got}")]
    SizeMismatch { expected: usize, got: usize },

    /// Number of indices does not match the array rank.
    #[error("rank mismatch: expected {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// An index exceeds its dimension.
    #[error("index {index} out of range for axis {axis} with size {dim}")]
    IndexOutOfRange { axis: usize, index: usize, dim: usize },

    /// Axis permutation is not a bijection on `[0, rank)`.
    #[error("invalid permutation {perm:?} for rank {rank}")]
    InvalidPermutation { perm: Vec<usize>, rank: usize },

    /// Invalid axis index for the given array rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Shapes cannot be broadcast together.
    #[error("incompatible shapes for broadcasting: {0:?} vs {1:?}")]
    IncompatibleShapes(Vec<usize>, Vec<usize>),

    /// A rank-2 array was required.
    #[error("expected a matrix (rank 2), got rank {0}")]
    NotMatrix(usize),

    /// Operand shapes are incompatible for a linear algebra operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Matrix is not square when a square matrix was required.
    #[error("non-square matrix: rows={rows}, cols={cols}")]
    NotSquare { rows: usize, cols: usize },

    /// A pivot fell below [`PIVOT_TOLERANCE`].
    #[error("matrix is singular to working precision")]
    SingularMatrix,

    /// An element lies outside the domain of a partial operation.
    #[error("domain error in {op}: {detail}")]
    Domain { op: &'static str, detail: String },

    /// Shape product does not fit in `usize`.
    #[error("shape {0:?} overflows the addressable element count")]
    Overflow(Vec<usize>),

    /// A reduction received no elements.
    #[error("{0} of empty input")]
    EmptyInput(&'static str),

    /// The operation would produce a result this library does not represent.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// An argument is malformed for the operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unrecognised norm name.
    #[error("unknown norm kind {0:?}")]
    UnknownNorm(String),
}

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, ArrayError>;
