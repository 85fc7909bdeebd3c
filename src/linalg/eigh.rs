//! Symmetric/Hermitian eigendecomposition via cyclic Jacobi sweeps

use super::jacobi::{check_hermitian, identity_matrix, rotate_columns, JacobiRotation};
use super::EighOpts;
use crate::dtype::{DType, LinalgScalar};
use crate::error::{Error, Result};
use crate::resolve;
use crate::tensor::Tensor;
use num_complex::Complex;
use rayon::prelude::*;

/// Eigendecomposition of a batch of Hermitian/symmetric matrices
///
/// Returns `(eigenvalues, eigenvectors)` with `A ≈ V · diag(w) · Vᴴ` per
/// batch entry. Eigenvalues are real (in the real component dtype) and not
/// guaranteed sorted. The cyclic Jacobi iteration is bounded by
/// `opts.max_iter` sweeps with convergence tolerance `opts.eps` on the
/// largest off-diagonal magnitude; stopping at the bound is accepted
/// approximate behavior, not a failure.
pub fn eigh(a: &Tensor, opts: &EighOpts) -> Result<(Tensor, Tensor)> {
    eigh_reference(a, opts)
}

/// [`eigh`] with a caller-supplied decomposition strategy
pub fn eigh_with<D: super::Decomposer + ?Sized>(
    a: &Tensor,
    opts: &EighOpts,
    decomposer: &D,
) -> Result<(Tensor, Tensor)> {
    decomposer.eigh(a, opts)
}

pub(crate) fn eigh_reference(a: &Tensor, opts: &EighOpts) -> Result<(Tensor, Tensor)> {
    let (val_tpl, vec_tpl) = resolve::eigh(a.shape(), a.dtype())?;
    let a = a.cast(vec_tpl.dtype)?;
    match vec_tpl.dtype {
        DType::F32 => run::<f32>(&a, opts, &val_tpl, &vec_tpl),
        DType::F64 => run::<f64>(&a, opts, &val_tpl, &vec_tpl),
        DType::C64 => run::<Complex<f32>>(&a, opts, &val_tpl, &vec_tpl),
        DType::C128 => run::<Complex<f64>>(&a, opts, &val_tpl, &vec_tpl),
        other => Err(Error::Internal(format!(
            "eigh dispatched on unpromoted dtype {other}"
        ))),
    }
}

fn run<T: LinalgScalar>(
    a: &Tensor,
    opts: &EighOpts,
    val_tpl: &resolve::Template,
    vec_tpl: &resolve::Template,
) -> Result<(Tensor, Tensor)> {
    let n = a.shape()[a.ndim() - 1];
    let data = a.data::<T>()?;
    if data.is_empty() {
        return Ok((
            Tensor::zeros(&val_tpl.shape, val_tpl.dtype),
            Tensor::zeros(&vec_tpl.shape, vec_tpl.dtype),
        ));
    }

    let entries: Vec<(Vec<f64>, Vec<T>)> = data
        .par_chunks(n * n)
        .map(|entry| eigh_entry(entry, n, opts))
        .collect::<Result<Vec<_>>>()?;

    let mut values = Vec::with_capacity(entries.len() * n);
    let mut vectors = Vec::with_capacity(data.len());
    for (ev, evec) in entries {
        values.extend(ev);
        vectors.extend(evec);
    }

    let values_tensor = match val_tpl.dtype {
        DType::F32 => Tensor::from_vec(
            values.iter().map(|v| *v as f32).collect::<Vec<_>>(),
            &val_tpl.shape,
        )?,
        _ => Tensor::from_vec(values, &val_tpl.shape)?,
    };
    Ok((values_tensor, Tensor::from_vec(vectors, &vec_tpl.shape)?))
}

/// Cyclic Jacobi on one batch entry
///
/// Each rotation zeroes one off-diagonal pair. For complex Hermitian input
/// the off-diagonal entry `a_pq = φ·r` is reduced to the real symmetric case
/// by folding the unit phase `φ` into the rotation: the applied unitary is
/// `diag(1, φ̄) · G(c, s)`, which leaves the transformed diagonal real.
fn eigh_entry<T: LinalgScalar>(a: &[T], n: usize, opts: &EighOpts) -> Result<(Vec<f64>, Vec<T>)> {
    check_hermitian(a, n)?;

    // Mirror the lower triangle so the working matrix is exactly Hermitian
    let mut work = vec![T::zero(); n * n];
    for i in 0..n {
        work[i * n + i] = T::from_f64(a[i * n + i].re());
        for j in 0..i {
            let val = a[i * n + j];
            work[i * n + j] = val;
            work[j * n + i] = val.conj();
        }
    }
    let mut vectors = identity_matrix::<T>(n);

    for _sweep in 0..opts.max_iter {
        let mut max_off = 0.0f64;
        for p in 0..n {
            for q in (p + 1)..n {
                max_off = max_off.max(work[p * n + q].abs());
            }
        }
        if max_off < opts.eps {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let a_pq = work[p * n + q];
                let r = a_pq.abs();
                if r == 0.0 {
                    continue;
                }
                let a_pp = work[p * n + p].re();
                let a_qq = work[q * n + q].re();
                let rot = JacobiRotation::compute(a_pp, a_qq, r);
                let phase_conj = (a_pq / T::from_f64(r)).conj();
                apply_hermitian_rotation(&mut work, n, p, q, &rot, a_pp, a_qq, r, phase_conj);
                rotate_columns(&mut vectors, n, n, p, q, rot.c, rot.s, phase_conj);
            }
        }
    }

    let values = (0..n).map(|i| work[i * n + i].re()).collect();
    Ok((values, vectors))
}

/// Two-sided update `A ← Jᴴ·A·J` zeroing the `(p, q)` pair, maintaining
/// Hermitian symmetry explicitly
#[allow(clippy::too_many_arguments)]
fn apply_hermitian_rotation<T: LinalgScalar>(
    work: &mut [T],
    n: usize,
    p: usize,
    q: usize,
    rot: &JacobiRotation,
    a_pp: f64,
    a_qq: f64,
    r: f64,
    phase_conj: T,
) {
    let c = T::from_f64(rot.c);
    let s = T::from_f64(rot.s);

    for k in 0..n {
        if k == p || k == q {
            continue;
        }
        let a_kp = work[k * n + p];
        let a_kq = phase_conj * work[k * n + q];

        let new_kp = c * a_kp - s * a_kq;
        let new_kq = s * a_kp + c * a_kq;

        work[k * n + p] = new_kp;
        work[p * n + k] = new_kp.conj();
        work[k * n + q] = new_kq;
        work[q * n + k] = new_kq.conj();
    }

    let (c2, s2, cs2) = (rot.c * rot.c, rot.s * rot.s, 2.0 * rot.c * rot.s);
    work[p * n + p] = T::from_f64(c2 * a_pp - cs2 * r + s2 * a_qq);
    work[q * n + q] = T::from_f64(s2 * a_pp + cs2 * r + c2 * a_qq);
    work[p * n + q] = T::zero();
    work[q * n + p] = T::zero();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::EighOpts;

    fn tight() -> EighOpts {
        EighOpts {
            max_iter: 100,
            eps: 1e-12,
        }
    }

    #[test]
    fn test_eigh_2x2_known_values() {
        // [[0, 1], [1, 0]] has eigenvalues {-1, 1}
        let a = Tensor::from_slice(&[0.0f64, 1.0, 1.0, 0.0], &[2, 2]).unwrap();
        let (values, _vectors) = eigh(&a, &tight()).unwrap();
        let mut vals = values.to_vec::<f64>().unwrap();
        vals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((vals[0] + 1.0).abs() < 1e-10);
        assert!((vals[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_eigh_rejects_asymmetric() {
        let a = Tensor::from_slice(&[1.0f64, 2.0, 0.0, 1.0], &[2, 2]).unwrap();
        let err = eigh(&a, &EighOpts::default()).unwrap_err();
        assert!(err.to_string().contains("must be hermitian"));
    }

    #[test]
    fn test_eigh_complex_hermitian_real_values() {
        // [[2, i], [-i, 2]] has eigenvalues {1, 3}
        let data = [
            Complex::new(2.0f64, 0.0),
            Complex::new(0.0, 1.0),
            Complex::new(0.0, -1.0),
            Complex::new(2.0, 0.0),
        ];
        let a = Tensor::from_slice(&data, &[2, 2]).unwrap();
        let (values, _vectors) = eigh(&a, &tight()).unwrap();
        assert_eq!(values.dtype(), DType::F64);
        let mut vals = values.to_vec::<f64>().unwrap();
        vals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((vals[0] - 1.0).abs() < 1e-10);
        assert!((vals[1] - 3.0).abs() < 1e-10);
    }
}
