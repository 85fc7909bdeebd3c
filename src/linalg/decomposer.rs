//! Capability contract for decomposition strategies

use super::{EighOpts, LuOpts, QrOpts, SvdOpts};
use crate::error::Result;
use crate::tensor::Tensor;

/// Capability contract for decomposition strategies
///
/// One method per decomposition primitive. Derived operations (pseudo-
/// inverse, rank, nuclear norm, solves) depend only on this contract, so a
/// backend-optimized strategy can replace the reference algorithms without
/// changing callers. Strategies are injected per call through the `*_with`
/// operation variants; concurrent calls with different strategies never
/// interfere because no state is shared.
pub trait Decomposer: Send + Sync {
    /// Cholesky factor `L` with `L · Lᴴ = A`
    fn cholesky(&self, a: &Tensor) -> Result<Tensor>;

    /// LU factorization `(P, L, U)` with `P · L · U = A`
    fn lu(&self, a: &Tensor, opts: &LuOpts) -> Result<(Tensor, Tensor, Tensor)>;

    /// QR factorization `(Q, R)` with `Q · R = A`
    fn qr(&self, a: &Tensor, opts: &QrOpts) -> Result<(Tensor, Tensor)>;

    /// Eigendecomposition `(eigenvalues, eigenvectors)` of Hermitian input
    fn eigh(&self, a: &Tensor, opts: &EighOpts) -> Result<(Tensor, Tensor)>;

    /// Reduced SVD `(U, S, Vᵗ)` with `S` sorted descending
    fn svd(&self, a: &Tensor, opts: &SvdOpts) -> Result<(Tensor, Tensor, Tensor)>;
}

/// The built-in reference strategy
///
/// Uses the crate's native algorithms: Cholesky-Banachiewicz, Doolittle LU
/// with partial pivoting, Householder QR, cyclic Jacobi eigendecomposition,
/// and one-sided Jacobi SVD.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceDecomposer;

impl Decomposer for ReferenceDecomposer {
    fn cholesky(&self, a: &Tensor) -> Result<Tensor> {
        super::cholesky(a)
    }

    fn lu(&self, a: &Tensor, opts: &LuOpts) -> Result<(Tensor, Tensor, Tensor)> {
        super::lu(a, opts)
    }

    fn qr(&self, a: &Tensor, opts: &QrOpts) -> Result<(Tensor, Tensor)> {
        super::qr(a, opts)
    }

    fn eigh(&self, a: &Tensor, opts: &EighOpts) -> Result<(Tensor, Tensor)> {
        super::eigh::eigh_reference(a, opts)
    }

    fn svd(&self, a: &Tensor, opts: &SvdOpts) -> Result<(Tensor, Tensor, Tensor)> {
        super::svd::svd_reference(a, opts)
    }
}
