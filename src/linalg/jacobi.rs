//! Shared Jacobi utilities for the iterative eigensolver and SVD
//!
//! The rotation parameters use the numerically stable LAPACK formula to
//! avoid catastrophic cancellation when diagonal entries are close.

use crate::dtype::LinalgScalar;
use crate::error::{Error, Result};

/// Tolerance factor for the Hermitian/symmetric precheck, relative to the
/// largest element magnitude of the batch entry
pub(crate) const HERMITIAN_EPS: f64 = 1e-8;

/// Jacobi rotation parameters (cosine and sine of the rotation angle)
#[derive(Debug, Clone, Copy)]
pub(crate) struct JacobiRotation {
    /// Cosine of rotation angle
    pub c: f64,
    /// Sine of rotation angle
    pub s: f64,
}

impl JacobiRotation {
    /// Compute rotation parameters zeroing the off-diagonal of the 2x2
    /// symmetric block `[[a_pp, a_pq], [a_pq, a_qq]]`
    ///
    /// ```text
    /// τ = (a_qq - a_pp) / (2 · a_pq)
    /// t = sign(τ) / (|τ| + sqrt(1 + τ²))
    /// c = 1 / sqrt(1 + t²)
    /// s = t · c
    /// ```
    #[inline]
    pub fn compute(a_pp: f64, a_qq: f64, a_pq: f64) -> Self {
        let tau_num = a_qq - a_pp;
        let tau_den = 2.0 * a_pq;

        if tau_den.abs() < 1e-300 {
            return Self { c: 1.0, s: 0.0 };
        }

        let tau = tau_num / tau_den;
        let t = if tau >= 0.0 {
            1.0 / (tau + (1.0 + tau * tau).sqrt())
        } else {
            -1.0 / (-tau + (1.0 + tau * tau).sqrt())
        };

        let c = 1.0 / (1.0 + t * t).sqrt();
        let s = t * c;

        Self { c, s }
    }
}

/// Apply a phased Jacobi rotation to two columns of a row-major matrix
///
/// Computes `[col_p', col_q'] = [col_p, φ̄·col_q] · [[c, s], [-s, c]]` where
/// `φ̄` is `phase_conj`. With `phase_conj = 1` this is the plain real
/// rotation used by the one-sided Jacobi SVD; the eigensolver passes the
/// conjugate phase of the off-diagonal entry to handle Hermitian input.
#[inline]
#[allow(clippy::too_many_arguments)]
pub(crate) fn rotate_columns<T: LinalgScalar>(
    data: &mut [T],
    rows: usize,
    cols: usize,
    p: usize,
    q: usize,
    c: f64,
    s: f64,
    phase_conj: T,
) {
    let c = T::from_f64(c);
    let s = T::from_f64(s);
    for i in 0..rows {
        let idx_p = i * cols + p;
        let idx_q = i * cols + q;

        let val_p = data[idx_p];
        let val_q = phase_conj * data[idx_q];

        data[idx_p] = c * val_p - s * val_q;
        data[idx_q] = s * val_p + c * val_q;
    }
}

/// Verify a batch entry is Hermitian (symmetric for real elements) within
/// tolerance, per the adjoint definition `X = adjoint(X)`
pub(crate) fn check_hermitian<T: LinalgScalar>(m: &[T], n: usize) -> Result<()> {
    let mut scale = 1.0f64;
    for v in m {
        scale = scale.max(v.abs());
    }
    let tol = HERMITIAN_EPS * scale;
    for i in 0..n {
        for j in i..n {
            let diff = m[i * n + j] - m[j * n + i].conj();
            if diff.abs() > tol {
                return Err(Error::hermitian_expected());
            }
        }
    }
    Ok(())
}

/// Sort indices by value (descending)
#[inline]
pub(crate) fn argsort_desc(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&i, &j| {
        values[j]
            .partial_cmp(&values[i])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// Reorder matrix columns according to an index permutation, keeping the
/// first `new_cols` of the permuted order
#[inline]
pub(crate) fn permute_columns<T: LinalgScalar>(
    data: &[T],
    rows: usize,
    cols: usize,
    indices: &[usize],
    new_cols: usize,
) -> Vec<T> {
    let mut result = vec![T::zero(); rows * new_cols];
    for (new_idx, &old_idx) in indices.iter().take(new_cols).enumerate() {
        for i in 0..rows {
            result[i * new_cols + new_idx] = data[i * cols + old_idx];
        }
    }
    result
}

/// Initialize an identity matrix `[n × n]`
#[inline]
pub(crate) fn identity_matrix<T: LinalgScalar>(n: usize) -> Vec<T> {
    let mut result = vec![T::zero(); n * n];
    for i in 0..n {
        result[i * n + i] = T::one();
    }
    result
}
