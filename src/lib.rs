//! # linr
//!
//! **Batched linear algebra for N-dimensional tensors.**
//!
//! linr treats the trailing two axes of a tensor as a matrix and every leading
//! axis as a batch of independent matrix instances. It provides factorizations
//! (Cholesky, LU, QR, symmetric eigendecomposition, SVD) and derived
//! quantities (solves, inverses, determinants, norms, pseudo-inverses, rank,
//! integer matrix powers) over those batches.
//!
//! ## Design
//!
//! - **Resolve before compute**: every operation first runs a pure shape/type
//!   resolver that validates rank, squareness, and batch compatibility and
//!   produces output [`Template`](resolve::Template)s without touching data.
//!   Shape errors never trigger partial numeric work.
//! - **Promotion**: element types are promoted to a floating (or complex)
//!   type before any arithmetic. Integer inputs produce floating outputs.
//! - **Stable algorithms**: LU uses partial pivoting, QR uses Householder
//!   reflections, the general solve goes through QR rather than naive
//!   inversion, and the iterative eigensolver/SVD use Jacobi rotations with
//!   the stable LAPACK rotation formula.
//! - **Pluggable strategies**: the iterative primitives sit behind the
//!   [`Decomposer`](linalg::Decomposer) capability trait, so a
//!   backend-optimized implementation can be injected per call without
//!   changing callers.
//! - **Pure and immutable**: no operation mutates a tensor in place and none
//!   holds cross-call state; batch entries are computed with cross-batch data
//!   parallelism.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linr::prelude::*;
//!
//! let a = Tensor::from_slice(&[4.0, 2.0, 2.0, 3.0], &[2, 2])?;
//! let l = linalg::cholesky(&a)?;
//! let b = Tensor::from_slice(&[1.0, 2.0], &[2])?;
//! let x = linalg::solve(&a, &b)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub mod grad;
pub mod linalg;
pub mod ops;
pub mod resolve;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::DType;
    pub use crate::error::{Error, Result};
    pub use crate::grad::GradRegistry;
    pub use crate::linalg::{self, Decomposer, ReferenceDecomposer};
    pub use crate::ops::matmul;
    pub use crate::resolve::Template;
    pub use crate::tensor::{Shape, Tensor};
}
