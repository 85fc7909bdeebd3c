//! Cholesky factorization

use super::jacobi::check_hermitian;
use crate::dtype::{DType, LinalgScalar};
use crate::error::{Error, Result};
use crate::resolve::{self, Template};
use crate::tensor::Tensor;
use num_complex::Complex;
use rayon::prelude::*;

/// Cholesky factorization of a batch of Hermitian positive-definite matrices
///
/// Returns the lower-triangular factor `L` with `L · Lᴴ = A` per batch entry.
/// Complex input yields a complex factor. The input must be Hermitian
/// (symmetric for real input); positivity is not checked, and a non-positive
/// leading minor surfaces as NaN entries in the factor.
pub fn cholesky(a: &Tensor) -> Result<Tensor> {
    let tpl = resolve::cholesky(a.shape(), a.dtype())?;
    let a = a.cast(tpl.dtype)?;
    match tpl.dtype {
        DType::F32 => run::<f32>(&a, &tpl),
        DType::F64 => run::<f64>(&a, &tpl),
        DType::C64 => run::<Complex<f32>>(&a, &tpl),
        DType::C128 => run::<Complex<f64>>(&a, &tpl),
        other => Err(Error::Internal(format!(
            "cholesky dispatched on unpromoted dtype {other}"
        ))),
    }
}

fn run<T: LinalgScalar>(a: &Tensor, tpl: &Template) -> Result<Tensor> {
    let n = a.shape()[a.ndim() - 1];
    let data = a.data::<T>()?;
    if data.is_empty() {
        return Ok(Tensor::zeros(&tpl.shape, tpl.dtype));
    }
    let entries: Vec<Vec<T>> = data
        .par_chunks(n * n)
        .map(|entry| cholesky_entry(entry, n))
        .collect::<Result<Vec<_>>>()?;
    Tensor::from_vec(entries.concat(), &tpl.shape)
}

/// Cholesky-Banachiewicz: row by row, diagonal first, then the column below
fn cholesky_entry<T: LinalgScalar>(a: &[T], n: usize) -> Result<Vec<T>> {
    check_hermitian(a, n)?;
    let mut l = vec![T::zero(); n * n];

    for i in 0..n {
        // L[i,i] = sqrt(A[i,i] - Σ |L[i,k]|²); the partial sums are real for
        // Hermitian input, so the diagonal is accumulated in f64
        let mut sum_sq = 0.0f64;
        for k in 0..i {
            let v = l[i * n + k];
            sum_sq += v.abs() * v.abs();
        }
        let diag = a[i * n + i].re() - sum_sq;
        let l_ii = T::from_f64(diag.sqrt());
        l[i * n + i] = l_ii;

        for j in (i + 1)..n {
            let mut sum = T::zero();
            for k in 0..i {
                sum = sum + l[j * n + k] * l[i * n + k].conj();
            }
            l[j * n + i] = (a[j * n + i] - sum) / l_ii;
        }
    }

    Ok(l)
}
