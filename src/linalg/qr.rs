//! QR factorization via Householder reflections

use super::{QrMode, QrOpts};
use crate::dtype::{DType, LinalgScalar};
use crate::error::{Error, Result};
use crate::resolve;
use crate::tensor::Tensor;
use num_complex::Complex;
use rayon::prelude::*;

/// QR factorization of a batch of `{m, n}` matrices with `m ≥ n`
///
/// Returns `(Q, R)` with `Q · R = A`, `Q` with orthonormal columns and `R`
/// upper triangular. `Reduced` mode yields `Q: {m, k}`, `R: {k, n}` with
/// `k = min(m, n)`; `Complete` yields `Q: {m, m}`, `R: {m, n}`. Columns
/// whose remaining norm is at or below `opts.eps` are skipped during
/// triangularization.
pub fn qr(a: &Tensor, opts: &QrOpts) -> Result<(Tensor, Tensor)> {
    let (q_tpl, r_tpl) = resolve::qr(a.shape(), a.dtype(), opts.mode)?;
    let a = a.cast(q_tpl.dtype)?;
    match q_tpl.dtype {
        DType::F32 => run::<f32>(&a, opts, &q_tpl, &r_tpl),
        DType::F64 => run::<f64>(&a, opts, &q_tpl, &r_tpl),
        DType::C64 => run::<Complex<f32>>(&a, opts, &q_tpl, &r_tpl),
        DType::C128 => run::<Complex<f64>>(&a, opts, &q_tpl, &r_tpl),
        other => Err(Error::Internal(format!(
            "qr dispatched on unpromoted dtype {other}"
        ))),
    }
}

fn run<T: LinalgScalar>(
    a: &Tensor,
    opts: &QrOpts,
    q_tpl: &resolve::Template,
    r_tpl: &resolve::Template,
) -> Result<(Tensor, Tensor)> {
    let ndim = a.ndim();
    let m = a.shape()[ndim - 2];
    let n = a.shape()[ndim - 1];
    let complete = opts.mode == QrMode::Complete;
    let data = a.data::<T>()?;
    if data.is_empty() {
        return Ok((
            Tensor::zeros(&q_tpl.shape, q_tpl.dtype),
            Tensor::zeros(&r_tpl.shape, r_tpl.dtype),
        ));
    }

    let entries: Vec<(Vec<T>, Vec<T>)> = data
        .par_chunks(m * n)
        .map(|entry| qr_entry(entry, m, n, complete, opts.eps))
        .collect();

    let mut q = Vec::new();
    let mut r = Vec::new();
    for (eq, er) in entries {
        q.extend(eq);
        r.extend(er);
    }
    Ok((
        Tensor::from_vec(q, &q_tpl.shape)?,
        Tensor::from_vec(r, &r_tpl.shape)?,
    ))
}

/// Householder triangularization of one batch entry
///
/// Accumulates the full `m × m` orthogonal factor and slices it afterwards;
/// the reflector for column `col` acts on coordinates `col..m`, so the
/// running product touches columns beyond the reduced width.
fn qr_entry<T: LinalgScalar>(
    a: &[T],
    m: usize,
    n: usize,
    complete: bool,
    eps: f64,
) -> (Vec<T>, Vec<T>) {
    let k = m.min(n);
    let mut r = a.to_vec();
    let mut q = super::jacobi::identity_matrix::<T>(m);
    let mut v = vec![T::zero(); m];
    let mut w = vec![T::zero(); n];
    let two = T::from_f64(2.0);

    for col in 0..k {
        let x_len = m - col;

        // Norm of the column below (and including) the diagonal
        let mut norm_sq = 0.0f64;
        for i in 0..x_len {
            let val = r[(col + i) * n + col];
            norm_sq += val.abs() * val.abs();
        }
        let norm_x = norm_sq.sqrt();
        if norm_x <= eps {
            continue;
        }

        // alpha = -phase(x₀) · ‖x‖ keeps vᴴx real, so H = I - 2vvᴴ is a
        // valid reflector for complex input as well
        let x0 = r[col * n + col];
        let phase = if x0.abs() == 0.0 {
            T::one()
        } else {
            x0 / T::from_f64(x0.abs())
        };
        let alpha = phase * T::from_f64(-norm_x);

        // v = normalize(x - alpha·e₁)
        for i in 0..x_len {
            v[i] = r[(col + i) * n + col];
        }
        v[0] = v[0] - alpha;
        let mut v_norm_sq = 0.0f64;
        for val in v.iter().take(x_len) {
            v_norm_sq += val.abs() * val.abs();
        }
        let v_norm = v_norm_sq.sqrt();
        if v_norm <= eps {
            continue;
        }
        let inv = T::from_f64(1.0 / v_norm);
        for val in v.iter_mut().take(x_len) {
            *val = *val * inv;
        }

        // R[col.., col..] -= 2 v (vᴴ R[col.., col..])
        for j in 0..(n - col) {
            let mut wj = T::zero();
            for i in 0..x_len {
                wj = wj + v[i].conj() * r[(col + i) * n + (col + j)];
            }
            w[j] = wj;
        }
        for i in 0..x_len {
            let scale = two * v[i];
            for j in 0..(n - col) {
                let idx = (col + i) * n + (col + j);
                r[idx] = r[idx] - scale * w[j];
            }
        }

        // Q ← Q·H: Q[:, col..] -= 2 (Q v) vᴴ
        for row in 0..m {
            let mut dot = T::zero();
            for i in 0..x_len {
                dot = dot + q[row * m + (col + i)] * v[i];
            }
            let scale = two * dot;
            for i in 0..x_len {
                let idx = row * m + (col + i);
                q[idx] = q[idx] - scale * v[i].conj();
            }
        }
    }

    // Slice Q to the requested width and force R exactly triangular
    let q_cols = if complete { m } else { k };
    let mut q_out = vec![T::zero(); m * q_cols];
    for row in 0..m {
        for c in 0..q_cols {
            q_out[row * q_cols + c] = q[row * m + c];
        }
    }
    let r_rows = if complete { m } else { k };
    let mut r_out = vec![T::zero(); r_rows * n];
    for i in 0..r_rows {
        for j in i..n {
            r_out[i * n + j] = r[i * n + j];
        }
    }
    (q_out, r_out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::QrOpts;
    use crate::ops::matmul;

    fn assert_close(a: &[f64], b: &[f64]) {
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-10, "{x} vs {y}");
        }
    }

    #[test]
    fn test_qr_reconstructs_tall() {
        let a_data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let a = Tensor::from_slice(&a_data, &[4, 2]).unwrap();
        let (q, r) = qr(&a, &QrOpts::default()).unwrap();
        assert_eq!(q.shape(), &[4, 2]);
        assert_eq!(r.shape(), &[2, 2]);
        let back = matmul(&q, &r).unwrap();
        assert_close(&back.to_vec::<f64>().unwrap(), &a_data);

        // Orthonormal columns: QᵀQ = I
        let qtq = matmul(&q.adjoint().unwrap(), &q).unwrap();
        assert_close(&qtq.to_vec::<f64>().unwrap(), &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_qr_complete_square_q() {
        let a = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2]).unwrap();
        let (q, r) = qr(
            &a,
            &QrOpts {
                mode: QrMode::Complete,
                ..QrOpts::default()
            },
        )
        .unwrap();
        assert_eq!(q.shape(), &[3, 3]);
        assert_eq!(r.shape(), &[3, 2]);
        let back = matmul(&q, &r).unwrap();
        assert_close(
            &back.to_vec::<f64>().unwrap(),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        );
    }

    #[test]
    fn test_qr_rejects_wide() {
        let a = Tensor::zeros(&[2, 3], DType::F64);
        assert!(qr(&a, &QrOpts::default()).is_err());
    }
}
