//! LU factorization with partial pivoting

use super::LuOpts;
use crate::dtype::{DType, LinalgScalar};
use crate::error::{Error, Result};
use crate::resolve;
use crate::tensor::Tensor;
use num_complex::Complex;
use rayon::prelude::*;

/// LU factorization of a batch of square matrices
///
/// Returns `(P, L, U)` with `P` a permutation matrix, `L` unit-lower
/// triangular, `U` upper triangular, and `P · L · U = A` per batch entry.
/// Partial pivoting picks the largest-magnitude pivot in each column;
/// columns whose best pivot magnitude is at or below `opts.eps` are left
/// uneliminated, so rank-deficient input yields a `U` with (near-)zero
/// diagonal entries rather than an error; the determinant and solve layers
/// interpret those.
pub fn lu(a: &Tensor, opts: &LuOpts) -> Result<(Tensor, Tensor, Tensor)> {
    let (p_tpl, l_tpl, u_tpl) = resolve::lu(a.shape(), a.dtype())?;
    let a = a.cast(p_tpl.dtype)?;
    match p_tpl.dtype {
        DType::F32 => run::<f32>(&a, opts, &p_tpl.shape),
        DType::F64 => run::<f64>(&a, opts, &p_tpl.shape),
        DType::C64 => run::<Complex<f32>>(&a, opts, &p_tpl.shape),
        DType::C128 => run::<Complex<f64>>(&a, opts, &p_tpl.shape),
        other => Err(Error::Internal(format!(
            "lu dispatched on unpromoted dtype {other}"
        ))),
    }
    .map(|(p, l, u)| {
        debug_assert_eq!(l.shape(), l_tpl.shape.as_slice());
        debug_assert_eq!(u.shape(), u_tpl.shape.as_slice());
        (p, l, u)
    })
}

fn run<T: LinalgScalar>(
    a: &Tensor,
    opts: &LuOpts,
    shape: &crate::tensor::Shape,
) -> Result<(Tensor, Tensor, Tensor)> {
    let n = a.shape()[a.ndim() - 1];
    let data = a.data::<T>()?;
    if data.is_empty() {
        let empty = || Tensor::zeros(shape, T::DTYPE);
        return Ok((empty(), empty(), empty()));
    }

    let entries: Vec<(Vec<T>, Vec<T>, Vec<T>)> = data
        .par_chunks(n * n)
        .map(|entry| {
            let factor = lu_entry(entry, n, opts.eps);
            factor.split()
        })
        .collect();

    let mut p = Vec::with_capacity(data.len());
    let mut l = Vec::with_capacity(data.len());
    let mut u = Vec::with_capacity(data.len());
    for (ep, el, eu) in entries {
        p.extend(ep);
        l.extend(el);
        u.extend(eu);
    }
    Ok((
        Tensor::from_vec(p, shape)?,
        Tensor::from_vec(l, shape)?,
        Tensor::from_vec(u, shape)?,
    ))
}

/// One factored batch entry: `L` and `U` packed in `work`, plus the row
/// permutation (`perm[i]` = original row index now at position `i`)
pub(crate) struct LuFactor<T> {
    pub work: Vec<T>,
    pub perm: Vec<usize>,
    n: usize,
}

impl<T: LinalgScalar> LuFactor<T> {
    /// Diagonal of `U`
    pub fn u_diag(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.n).map(|i| self.work[i * self.n + i])
    }

    /// Inversion count of the row permutation; its parity gives the sign of
    /// the permutation matrix's determinant
    pub fn inversions(&self) -> usize {
        let mut count = 0;
        for i in 0..self.perm.len() {
            for j in (i + 1)..self.perm.len() {
                if self.perm[i] > self.perm[j] {
                    count += 1;
                }
            }
        }
        count
    }

    /// Split into explicit `(P, L, U)` matrices
    fn split(&self) -> (Vec<T>, Vec<T>, Vec<T>) {
        let n = self.n;
        let mut p = vec![T::zero(); n * n];
        let mut l = vec![T::zero(); n * n];
        let mut u = vec![T::zero(); n * n];
        for i in 0..n {
            p[self.perm[i] * n + i] = T::one();
            l[i * n + i] = T::one();
            for j in 0..n {
                if j < i {
                    l[i * n + j] = self.work[i * n + j];
                } else {
                    u[i * n + j] = self.work[i * n + j];
                }
            }
        }
        (p, l, u)
    }
}

/// Doolittle elimination with partial pivoting on one batch entry
pub(crate) fn lu_entry<T: LinalgScalar>(a: &[T], n: usize, eps: f64) -> LuFactor<T> {
    let mut work = a.to_vec();
    let mut perm: Vec<usize> = (0..n).collect();

    for col in 0..n {
        let mut pivot_row = col;
        let mut max_val = work[col * n + col].abs();
        for row in (col + 1)..n {
            let val = work[row * n + col].abs();
            if val > max_val {
                max_val = val;
                pivot_row = row;
            }
        }

        if pivot_row != col {
            for j in 0..n {
                work.swap(col * n + j, pivot_row * n + j);
            }
            perm.swap(col, pivot_row);
        }

        let pivot = work[col * n + col];
        if pivot.abs() <= eps {
            // Degenerate column: keep the (near-)zero diagonal for callers
            continue;
        }

        for row in (col + 1)..n {
            work[row * n + col] = work[row * n + col] / pivot;
            let multiplier = work[row * n + col];
            for j in (col + 1)..n {
                work[row * n + j] = work[row * n + j] - multiplier * work[col * n + j];
            }
        }
    }

    LuFactor { work, perm, n }
}
