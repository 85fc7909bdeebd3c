//! Batched matrix product

use crate::dtype::{DType, LinalgScalar};
use crate::error::{Error, Result};
use crate::resolve::{self, Template};
use crate::tensor::Tensor;
use rayon::prelude::*;

/// Batched matrix product over the trailing two axes
///
/// Both operands must share identical batch dimensions (no broadcasting or
/// truncation) and compatible inner matrix dimensions. Inputs are promoted to
/// a common floating/complex dtype before multiplication.
pub fn matmul(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let tpl = resolve::matmul(a.shape(), a.dtype(), b.shape(), b.dtype())?;
    let a = a.cast(tpl.dtype)?;
    let b = b.cast(tpl.dtype)?;
    match tpl.dtype {
        DType::F32 => run::<f32>(&a, &b, &tpl),
        DType::F64 => run::<f64>(&a, &b, &tpl),
        DType::C64 => run::<num_complex::Complex<f32>>(&a, &b, &tpl),
        DType::C128 => run::<num_complex::Complex<f64>>(&a, &b, &tpl),
        other => Err(Error::Internal(format!(
            "matmul dispatched on unpromoted dtype {other}"
        ))),
    }
}

fn run<T: LinalgScalar>(a: &Tensor, b: &Tensor, tpl: &Template) -> Result<Tensor> {
    let ndim = a.ndim();
    let m = a.shape()[ndim - 2];
    let k = a.shape()[ndim - 1];
    let n = b.shape()[b.ndim() - 1];
    let batch = a.dims().batch_size();

    let a_data = a.data::<T>()?;
    let b_data = b.data::<T>()?;
    if batch == 0 || m * n == 0 {
        return Ok(Tensor::zeros(&tpl.shape, tpl.dtype));
    }

    let entries: Vec<Vec<T>> = (0..batch)
        .into_par_iter()
        .map(|bi| {
            let a_off = bi * m * k;
            let b_off = bi * k * n;
            let mut out = vec![T::zero(); m * n];
            for i in 0..m {
                for l in 0..k {
                    let av = a_data[a_off + i * k + l];
                    for j in 0..n {
                        out[i * n + j] = out[i * n + j] + av * b_data[b_off + l * n + j];
                    }
                }
            }
            out
        })
        .collect();

    Tensor::from_vec(entries.concat(), &tpl.shape)
}
