//! Singular value decomposition via one-sided Jacobi

use super::jacobi::{argsort_desc, identity_matrix, permute_columns, rotate_columns, JacobiRotation};
use super::SvdOpts;
use crate::dtype::{DType, LinalgScalar};
use crate::error::{Error, Result};
use crate::resolve;
use crate::tensor::Tensor;
use rayon::prelude::*;

/// Reduced SVD of a batch of real `{m, n}` matrices
///
/// Returns `(U, S, Vᵗ)` with `U · diag(S) · Vᵗ ≈ A` per batch entry and the
/// singular values in `S` sorted descending. Complex input is documented but
/// unsupported in this core. The one-sided Jacobi iteration is bounded by
/// `opts.max_iter` sweeps.
pub fn svd(a: &Tensor, opts: &SvdOpts) -> Result<(Tensor, Tensor, Tensor)> {
    svd_reference(a, opts)
}

/// [`svd`] with a caller-supplied decomposition strategy
///
/// The engine depends only on the `(U, S, Vᵗ)` contract, so an optimized
/// iterative scheme can be injected per call without changing callers.
pub fn svd_with<D: super::Decomposer + ?Sized>(
    a: &Tensor,
    opts: &SvdOpts,
    decomposer: &D,
) -> Result<(Tensor, Tensor, Tensor)> {
    decomposer.svd(a, opts)
}

pub(crate) fn svd_reference(a: &Tensor, opts: &SvdOpts) -> Result<(Tensor, Tensor, Tensor)> {
    let (u_tpl, s_tpl, vt_tpl) = resolve::svd(a.shape(), a.dtype())?;
    let a = a.cast(u_tpl.dtype)?;
    match u_tpl.dtype {
        DType::F32 => run::<f32>(&a, opts, &u_tpl, &s_tpl, &vt_tpl),
        DType::F64 => run::<f64>(&a, opts, &u_tpl, &s_tpl, &vt_tpl),
        other => Err(Error::Internal(format!(
            "svd dispatched on unpromoted dtype {other}"
        ))),
    }
}

fn run<T: LinalgScalar>(
    a: &Tensor,
    opts: &SvdOpts,
    u_tpl: &resolve::Template,
    s_tpl: &resolve::Template,
    vt_tpl: &resolve::Template,
) -> Result<(Tensor, Tensor, Tensor)> {
    let ndim = a.ndim();
    let m = a.shape()[ndim - 2];
    let n = a.shape()[ndim - 1];
    let data = a.data::<T>()?;
    if data.is_empty() {
        return Ok((
            Tensor::zeros(&u_tpl.shape, u_tpl.dtype),
            Tensor::zeros(&s_tpl.shape, s_tpl.dtype),
            Tensor::zeros(&vt_tpl.shape, vt_tpl.dtype),
        ));
    }

    let entries: Vec<(Vec<T>, Vec<T>, Vec<T>)> = data
        .par_chunks(m * n)
        .map(|entry| svd_entry(entry, m, n, opts.max_iter))
        .collect();

    let mut u = Vec::new();
    let mut s = Vec::new();
    let mut vt = Vec::new();
    for (eu, es, evt) in entries {
        u.extend(eu);
        s.extend(es);
        vt.extend(evt);
    }
    Ok((
        Tensor::from_vec(u, &u_tpl.shape)?,
        Tensor::from_vec(s, &s_tpl.shape)?,
        Tensor::from_vec(vt, &vt_tpl.shape)?,
    ))
}

/// One-sided Jacobi on one batch entry
///
/// Rotates column pairs of a working copy `B` until the columns are mutually
/// orthogonal, accumulating the rotations into `V`. Singular values are the
/// final column norms, `U` the normalized columns. Matrices with `m < n` go
/// through the transpose and swap `U ↔ Vᵗ` at the end.
fn svd_entry<T: LinalgScalar>(
    a: &[T],
    m: usize,
    n: usize,
    max_sweeps: usize,
) -> (Vec<T>, Vec<T>, Vec<T>) {
    let k = m.min(n);
    if m == 0 || n == 0 {
        return (vec![], vec![], vec![]);
    }

    let transpose = m < n;
    let (work_m, work_n) = if transpose { (n, m) } else { (m, n) };
    let mut b: Vec<T> = if transpose {
        let mut t = vec![T::zero(); m * n];
        for i in 0..m {
            for j in 0..n {
                t[j * work_n + i] = a[i * n + j];
            }
        }
        t
    } else {
        a.to_vec()
    };

    let mut v = identity_matrix::<T>(work_n);
    let eps = T::epsilon();
    let tol = work_n as f64 * eps;

    for _sweep in 0..max_sweeps {
        let mut off_diag_sum = 0.0f64;

        for p in 0..work_n {
            for q in (p + 1)..work_n {
                // Gram elements of columns p and q
                let mut a_pp = 0.0f64;
                let mut a_qq = 0.0f64;
                let mut a_pq = 0.0f64;
                for i in 0..work_m {
                    let bp = b[i * work_n + p].re();
                    let bq = b[i * work_n + q].re();
                    a_pp += bp * bp;
                    a_qq += bq * bq;
                    a_pq += bp * bq;
                }

                off_diag_sum += a_pq * a_pq;
                if a_pq.abs() < tol * (a_pp * a_qq).sqrt() {
                    continue;
                }

                let rot = JacobiRotation::compute(a_pp, a_qq, a_pq);
                rotate_columns(&mut b, work_m, work_n, p, q, rot.c, rot.s, T::one());
                rotate_columns(&mut v, work_n, work_n, p, q, rot.c, rot.s, T::one());
            }
        }

        if off_diag_sum.sqrt() < tol {
            break;
        }
    }

    // Singular values are the column norms; normalized columns form U
    let mut norms = vec![0.0f64; work_n];
    for j in 0..work_n {
        let mut norm_sq = 0.0f64;
        for i in 0..work_m {
            let val = b[i * work_n + j].re();
            norm_sq += val * val;
        }
        let norm = norm_sq.sqrt();
        norms[j] = norm;
        if norm > eps {
            let inv = T::from_f64(1.0 / norm);
            for i in 0..work_m {
                b[i * work_n + j] = b[i * work_n + j] * inv;
            }
        } else {
            for i in 0..work_m {
                b[i * work_n + j] = T::zero();
            }
        }
    }

    let work_k = work_m.min(work_n);
    let indices = argsort_desc(&norms);
    let s_sorted: Vec<T> = indices
        .iter()
        .take(work_k)
        .map(|&idx| T::from_f64(norms[idx]))
        .collect();
    let u_sorted = permute_columns(&b, work_m, work_n, &indices, work_k);
    let mut vt_sorted = vec![T::zero(); work_k * work_n];
    for (new_idx, &old_idx) in indices.iter().take(work_k).enumerate() {
        for j in 0..work_n {
            vt_sorted[new_idx * work_n + j] = v[j * work_n + old_idx];
        }
    }

    if transpose {
        // A = (A')ᵗ = (U'·S·V'ᵗ)ᵗ, so U = V' and Vᵗ = U'ᵗ
        let mut u_final = vec![T::zero(); m * k];
        for i in 0..k {
            for j in 0..m {
                u_final[j * k + i] = vt_sorted[i * work_n + j];
            }
        }
        let mut vt_final = vec![T::zero(); k * n];
        for i in 0..work_m {
            for j in 0..work_k {
                vt_final[j * n + i] = u_sorted[i * work_k + j];
            }
        }
        (u_final, s_sorted, vt_final)
    } else {
        (u_sorted, s_sorted, vt_sorted)
    }
}
