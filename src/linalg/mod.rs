//! Batched linear algebra operations
//!
//! Every operation here follows the same two-phase shape: a pure resolver
//! pass (see [`crate::resolve`]) that validates shapes and computes output
//! templates, then a numeric pass that casts inputs to the promoted dtype and
//! dispatches a typed kernel per batch entry. Batch entries are independent
//! and are processed with cross-batch data parallelism.
//!
//! The iterative primitives (SVD, eigendecomposition) are exposed through the
//! [`Decomposer`] capability trait; the `*_with` variants accept a strategy
//! per call, and the plain functions use the built-in
//! [`ReferenceDecomposer`].

mod cholesky;
mod decomposer;
mod det;
mod eigh;
mod jacobi;
mod lu;
mod norm;
mod pinv;
mod power;
mod qr;
mod rank;
mod solve;
mod svd;
mod triangular;

pub use cholesky::cholesky;
pub use decomposer::{Decomposer, ReferenceDecomposer};
pub use det::determinant;
pub use eigh::{eigh, eigh_with};
pub use lu::lu;
pub use norm::{norm, norm_with};
pub use pinv::{pinv, pinv_with};
pub use power::matrix_power;
pub use qr::qr;
pub use rank::{matrix_rank, matrix_rank_with};
pub use solve::{invert, solve};
pub use svd::{svd, svd_with};
pub use triangular::triangular_solve;

/// Default rounding/pivot threshold shared by the `eps` options
///
/// Backs the defaults of [`LuOpts`], [`QrOpts`], [`PinvOpts`], and
/// [`RankOpts`], and the near-zero divisor gate in the triangular solver, so
/// "singular" means the same thing on every path that can raise
/// [`crate::error::Error::SingularMatrix`].
pub const DEFAULT_EPS: f64 = 1e-10;

/// Which factorization shape `qr` produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrMode {
    /// `Q: {m, k}`, `R: {k, n}` with `k = min(m, n)`
    #[default]
    Reduced,
    /// `Q: {m, m}`, `R: {m, n}`
    Complete,
}

/// Transformation applied to the triangular factor in `triangular_solve`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transform {
    /// Use the factor as given
    #[default]
    None,
    /// Use the transposed factor
    Transpose,
    /// Conjugation is documented but unsupported in this core
    Conjugate,
}

/// Norm order selector for [`norm`]
///
/// `None` in [`NormOpts::ord`] selects the Euclidean norm for vectors and the
/// Frobenius norm for matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormOrd {
    /// Integer order: p-norms for vectors, column/row-sum and spectral-family
    /// norms for matrices
    P(i64),
    /// Maximum absolute value (vectors) or maximum row absolute-sum (matrices)
    Inf,
    /// Minimum absolute value (vectors) or minimum row absolute-sum (matrices)
    NegInf,
    /// Frobenius norm; requires a 2-D tensor
    Frobenius,
    /// Nuclear norm (sum of singular values); requires a 2-D tensor
    Nuclear,
}

/// Options for [`lu`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LuOpts {
    /// Pivot threshold: pivots with magnitude at or below it are left in
    /// place, yielding a (near-)zero diagonal in `U` instead of an error
    pub eps: f64,
}

impl Default for LuOpts {
    fn default() -> Self {
        Self { eps: DEFAULT_EPS }
    }
}

/// Options for [`qr`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QrOpts {
    /// Output mode: reduced or complete factorization
    pub mode: QrMode,
    /// Rounding threshold applied during triangularization
    pub eps: f64,
}

impl Default for QrOpts {
    fn default() -> Self {
        Self {
            mode: QrMode::Reduced,
            eps: DEFAULT_EPS,
        }
    }
}

/// Options for [`eigh`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EighOpts {
    /// Maximum number of Jacobi sweeps; the result after the bound is
    /// accepted approximate behavior, not a failure
    pub max_iter: usize,
    /// Convergence tolerance on the largest off-diagonal magnitude
    pub eps: f64,
}

impl Default for EighOpts {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            eps: 1e-4,
        }
    }
}

/// Options for [`svd`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvdOpts {
    /// Maximum number of one-sided Jacobi sweeps
    pub max_iter: usize,
}

impl Default for SvdOpts {
    fn default() -> Self {
        Self { max_iter: 100 }
    }
}

/// Options for [`triangular_solve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangularOpts {
    /// Which half of `A` holds the triangular factor
    pub lower: bool,
    /// Solve `op(A)·X = B` when true, `X·op(A) = B` when false
    pub left_side: bool,
    /// Transformation applied to the factor
    pub transform: Transform,
}

impl Default for TriangularOpts {
    fn default() -> Self {
        Self {
            lower: true,
            left_side: true,
            transform: Transform::None,
        }
    }
}

/// Options for [`norm`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormOpts {
    /// Norm order; `None` selects Euclidean/Frobenius by rank
    pub ord: Option<NormOrd>,
    /// Reduction axes; only `None` (whole tensor) is implemented in this core
    pub axes: Option<Vec<isize>>,
}

/// Options for [`pinv`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinvOpts {
    /// Singular values at or below this threshold are treated as zero
    /// instead of inverted; also the element-wise zero-tensor test bound
    pub eps: f64,
}

impl Default for PinvOpts {
    fn default() -> Self {
        Self { eps: DEFAULT_EPS }
    }
}

/// Options for [`matrix_rank`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOpts {
    /// Relative tolerance factor: singular values above
    /// `eps · max(m, n) · max(singular values)` count toward the rank
    pub eps: f64,
}

impl Default for RankOpts {
    fn default() -> Self {
        Self { eps: DEFAULT_EPS }
    }
}
