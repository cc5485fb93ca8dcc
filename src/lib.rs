//! Rank- and contiguity-specialised views over externally owned strided memory.
//!
//! A view is a `(pointer, shape descriptor)` handle typed by its element type,
//! its rank `N` and its *contiguity level* `C`. The `(N, C)` pair is carried by
//! the zero-sized layout marker [`Dims`], and the [`ArrayTraits`] dispatcher
//! resolves, at compile time, what indexing and iterating a view produces:
//!
//! - rank `N > 1`: a one-rank-lower sub-view, walked by a [`NestedIter`]
//! - rank 1, `C == 0`: a scalar reference, walked by a [`StridedIter`]
//! - rank 1, `C == ±1`: a scalar reference, walked by a [`ContiguousIter`]
//!
//! Lazy elementwise expressions ([`UnaryOpExpression`], [`BinaryOpExpression`])
//! reduce their own rank as they are iterated, mirroring the views they wrap.
//!
//! # Contiguity levels
//!
//! - `C = 0`: no static guarantee
//! - `C = k > 0`: the innermost `k` dimensions are row-major packed
//! - `C = -k < 0`: the outermost `k` dimensions are column-major packed
//!
//! Stripping the outermost dimension of a `(N, C)` view yields a
//! `(N - 1, sub_contiguity(N, C))` view.
//!
//! # Example
//!
//! ```rust
//! use ndview::{ArrayView, Expression};
//!
//! let data = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
//! let a: ArrayView<'_, f64, 2, 2> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
//!
//! let mut visited = Vec::new();
//! for row in a.iter() {
//!     for x in row {
//!         visited.push(*x);
//!     }
//! }
//! assert_eq!(visited, data);
//!
//! // Lazy: nothing is computed until the expression is evaluated.
//! let doubled = a.clone() + a.clone();
//! let owned = doubled.evaluate();
//! assert_eq!(owned.as_slice(), &[0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
//! ```
//!
//! Widening a contiguity guarantee is a build failure, not a runtime error:
//!
//! ```compile_fail
//! use ndview::{ArrayView, Dims};
//!
//! let data = [0.0f64; 6];
//! let a: ArrayView<'_, f64, 2, 0> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
//! let _b = a.into_layout::<Dims<2, 2>>();
//! ```
//!
//! So is combining expressions of different rank:
//!
//! ```compile_fail
//! use ndview::ArrayView;
//!
//! let data = [0.0f64; 6];
//! let a: ArrayView<'_, f64, 2, 2> = ArrayView::from_row_major(&data, &[2, 3]).unwrap();
//! let b: ArrayView<'_, f64, 1, 1> = ArrayView::from_row_major(&data, &[6]).unwrap();
//! let _c = a + b;
//! ```

mod access;
mod array;
pub mod contiguity;
pub mod descriptor;
mod element_op;
mod expr;
mod iter;
mod traits;
mod view;

// ============================================================================
// Shape descriptor
// ============================================================================
pub use descriptor::{col_major_strides, row_major_strides, Anchor, Core, CorePtr};

// ============================================================================
// Trait dispatch
// ============================================================================
pub use access::{Access, Shared, Unique};
pub use traits::{ArrayTraits, Dims, NestedTraits, Rank, RankTag, MAX_RANK};

// ============================================================================
// Iteration
// ============================================================================
pub use iter::{ContiguousIter, Cursor, Iter, NestedIter, StridedIter};

// ============================================================================
// Views and owned arrays
// ============================================================================
pub use array::Array;
pub use view::{ArrayBase, ArrayView, ArrayViewMut, Idx, RawParts, SliceIndex, StridedRange};

// ============================================================================
// Expressions
// ============================================================================
pub use element_op::{
    AddOp, Adjoint, BinaryFunction, Compose, Conj, DivOp, ElementOp, ElementOpApply, Identity,
    MulOp, NegOp, SubOp, Transpose, UnaryFunction,
};
pub use expr::{
    map, zip_with, BinaryOpExpression, BinaryOpIter, BinaryStep, Expression, ScalarExpression,
    UnaryOpExpression, UnaryOpIter, UnaryStep,
};

// ============================================================================
// Error types
// ============================================================================

/// Errors raised by the checked construction and conversion entry points.
///
/// Rank and contiguity contracts between view *types* are enforced at compile
/// time; these variants only cover values that are known at run time.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// Number of extents or indices does not match the rank.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Shapes of two operands differ.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Stride array length doesn't match extents.
    #[error("stride and extent length mismatch")]
    StrideLengthMismatch,

    /// A reachable offset falls outside the backing buffer.
    #[error("offset overflow while computing pointer")]
    OffsetOverflow,

    /// Two distinct multi-indices address the same element of a mutable view.
    #[error("overlapping strides {strides:?} for extents {extents:?}")]
    OverlappingStrides {
        extents: Vec<usize>,
        strides: Vec<isize>,
    },

    /// Actual strides do not satisfy the requested contiguity level.
    #[error("strides {strides:?} for extents {extents:?} are not contiguous at level {required}")]
    ContiguityMismatch {
        required: i32,
        extents: Vec<usize>,
        strides: Vec<isize>,
    },

    /// Invalid axis index for the given rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },
}

/// Result type for view operations.
pub type Result<T> = std::result::Result<T, ViewError>;
