//! Determinant engine

use super::lu::lu_entry;
use super::DEFAULT_EPS;
use crate::dtype::{DType, LinalgScalar};
use crate::error::{Error, Result};
use crate::resolve;
use crate::tensor::Tensor;
use num_complex::Complex;
use rayon::prelude::*;

/// Determinant of a batch of square matrices
///
/// Always promoted to a floating type, even for integer input. 2×2 and 3×3
/// matrices use the Leibniz closed forms; larger matrices go through LU with
/// the determinant sign taken from the parity of the row permutation
/// (inversion count of its position mapping). A rank-deficient factorization,
/// meaning any (near-)zero diagonal entry in `U`, yields exactly `0`, not
/// merely a small value.
pub fn determinant(a: &Tensor) -> Result<Tensor> {
    let tpl = resolve::determinant(a.shape(), a.dtype())?;
    let a = a.cast(tpl.dtype)?;
    match tpl.dtype {
        DType::F32 => run::<f32>(&a, &tpl),
        DType::F64 => run::<f64>(&a, &tpl),
        DType::C64 => run::<Complex<f32>>(&a, &tpl),
        DType::C128 => run::<Complex<f64>>(&a, &tpl),
        other => Err(Error::Internal(format!(
            "determinant dispatched on unpromoted dtype {other}"
        ))),
    }
}

fn run<T: LinalgScalar>(a: &Tensor, tpl: &resolve::Template) -> Result<Tensor> {
    let n = a.shape()[a.ndim() - 1];
    let batch = a.dims().batch_size();

    // det of the empty matrix is the empty product
    if n == 0 {
        let ones = vec![T::one(); batch];
        return Tensor::from_vec(ones, &tpl.shape);
    }
    let data = a.data::<T>()?;
    if data.is_empty() {
        return Ok(Tensor::zeros(&tpl.shape, tpl.dtype));
    }

    let dets: Vec<T> = data
        .par_chunks(n * n)
        .map(|entry| det_entry(entry, n))
        .collect();
    Tensor::from_vec(dets, &tpl.shape)
}

fn det_entry<T: LinalgScalar>(a: &[T], n: usize) -> T {
    match n {
        1 => a[0],
        // Closed-form Leibniz expansions: diagonal products minus
        // anti-diagonal products
        2 => a[0] * a[3] - a[1] * a[2],
        3 => {
            a[0] * a[4] * a[8] + a[1] * a[5] * a[6] + a[2] * a[3] * a[7]
                - a[2] * a[4] * a[6]
                - a[1] * a[3] * a[8]
                - a[0] * a[5] * a[7]
        }
        _ => det_lu(a, n),
    }
}

/// `det(A) = ± Π diag(U)`, sign from the permutation parity
fn det_lu<T: LinalgScalar>(a: &[T], n: usize) -> T {
    let factor = lu_entry(a, n, DEFAULT_EPS);

    let mut det = if factor.inversions() % 2 == 0 {
        T::one()
    } else {
        -T::one()
    };
    for d in factor.u_diag() {
        if d.abs() <= DEFAULT_EPS {
            // Rank deficient: exactly zero regardless of the sign computation
            return T::zero();
        }
        det = det * d;
    }
    det
}
