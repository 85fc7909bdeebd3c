//! Moore-Penrose pseudo-inverse

use super::{Decomposer, PinvOpts, ReferenceDecomposer, SvdOpts};
use crate::dtype::{DType, LinalgScalar};
use crate::error::{Error, Result};
use crate::ops::matmul;
use crate::resolve;
use crate::tensor::Tensor;
use num_complex::Complex;

/// Pseudo-inverse of a scalar, vector, or batch of matrices
///
/// A tensor whose entries are all within `opts.eps` of zero maps to the zero
/// tensor of the transposed shape (the pseudo-inverse of the zero map).
/// Otherwise: rank 0 is `1/x`, rank 1 is `conj(x)/‖x‖²`, and rank ≥ 2 goes
/// through the SVD as `V · Σ⁺ · Uᴴ`, where singular values at or below
/// `opts.eps` are treated as zero instead of inverted.
pub fn pinv(a: &Tensor, opts: &PinvOpts) -> Result<Tensor> {
    pinv_with(a, opts, &ReferenceDecomposer)
}

/// [`pinv`] with a caller-supplied decomposition strategy
pub fn pinv_with<D: Decomposer + ?Sized>(
    a: &Tensor,
    opts: &PinvOpts,
    decomposer: &D,
) -> Result<Tensor> {
    let tpl = resolve::pinv(a.shape(), a.dtype())?;
    let a = a.cast(tpl.dtype)?;

    if a.abs_values().iter().all(|v| *v <= opts.eps) {
        return Ok(Tensor::zeros(&tpl.shape, tpl.dtype));
    }

    match a.ndim() {
        0 | 1 => match tpl.dtype {
            DType::F32 => closed_form::<f32>(&a, &tpl),
            DType::F64 => closed_form::<f64>(&a, &tpl),
            DType::C64 => closed_form::<Complex<f32>>(&a, &tpl),
            DType::C128 => closed_form::<Complex<f64>>(&a, &tpl),
            other => Err(Error::Internal(format!(
                "pinv dispatched on unpromoted dtype {other}"
            ))),
        },
        _ => svd_path(&a, opts, decomposer, &tpl),
    }
}

/// Rank 0: `1/x`; rank 1: `conj(x)/‖x‖²`
fn closed_form<T: LinalgScalar>(a: &Tensor, tpl: &resolve::Template) -> Result<Tensor> {
    let data = a.data::<T>()?;
    if a.ndim() == 0 {
        return Tensor::from_vec(vec![T::one() / data[0]], &tpl.shape);
    }
    let norm_sq: f64 = data.iter().map(|v| v.abs() * v.abs()).sum();
    let inv = T::from_f64(1.0 / norm_sq);
    let out: Vec<T> = data.iter().map(|v| v.conj() * inv).collect();
    Tensor::from_vec(out, &tpl.shape)
}

/// Rank ≥ 2: `V · Σ⁺ · Uᴴ` with eps-clipped reciprocal singular values
fn svd_path<D: Decomposer + ?Sized>(
    a: &Tensor,
    opts: &PinvOpts,
    decomposer: &D,
    tpl: &resolve::Template,
) -> Result<Tensor> {
    let (u, s, vt) = decomposer.svd(a, &SvdOpts::default())?;
    let k = s.shape()[s.ndim() - 1];

    let s_plus = match s.dtype() {
        DType::F32 => recip_diag::<f32>(&s, k, opts.eps)?,
        DType::F64 => recip_diag::<f64>(&s, k, opts.eps)?,
        other => {
            return Err(Error::Internal(format!(
                "pinv singular values in unexpected dtype {other}"
            )))
        }
    };

    let v = vt.adjoint()?;
    let uh = u.adjoint()?;
    let out = matmul(&matmul(&v, &s_plus)?, &uh)?;
    debug_assert_eq!(out.shape(), tpl.shape.as_slice());
    Ok(out)
}

/// Build the batched `Σ⁺` diagonal: reciprocals of singular values above the
/// threshold, zero otherwise (avoiding division blow-up for tiny values)
fn recip_diag<T: LinalgScalar>(s: &Tensor, k: usize, eps: f64) -> Result<Tensor> {
    let data = s.data::<T>()?;
    let batch = if k == 0 { 0 } else { data.len() / k };
    let mut diag = vec![T::zero(); batch * k * k];
    for b in 0..batch {
        for i in 0..k {
            let sv = data[b * k + i].re();
            if sv > eps {
                diag[b * k * k + i * k + i] = T::from_f64(1.0 / sv);
            }
        }
    }
    let shape: Vec<usize> = s.shape()[..s.ndim() - 1]
        .iter()
        .copied()
        .chain([k, k])
        .collect();
    Tensor::from_vec(diag, shape)
}
