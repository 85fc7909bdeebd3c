//! Integer matrix powers

use super::solve::invert;
use crate::error::{Error, Result};
use crate::ops::matmul;
use crate::resolve;
use crate::tensor::Tensor;

/// Raise a batch of square matrices to an integer power
///
/// `k = 0` returns the identity broadcast to the batch shape without reading
/// `A`'s data. Positive powers use binary exponentiation (squaring a running
/// factor and multiplying it into the accumulator on set bits) for
/// O(log k) batched matrix products. Negative powers invert first:
/// `matrix_power(A, -k) = matrix_power(invert(A), k)`.
pub fn matrix_power(a: &Tensor, k: i64) -> Result<Tensor> {
    let tpl = resolve::matrix_power(a.shape(), a.dtype())?;
    let n = a.shape()[a.ndim() - 1];

    if k == 0 {
        return Ok(Tensor::identity(a.dims().batch_dims(), n, tpl.dtype));
    }

    let mut square = if k < 0 { invert(a)? } else { a.cast(tpl.dtype)? };
    let mut exp = k.unsigned_abs();
    let mut result: Option<Tensor> = None;

    loop {
        if exp & 1 == 1 {
            result = Some(match result {
                Some(acc) => matmul(&acc, &square)?,
                None => square.clone(),
            });
        }
        exp >>= 1;
        if exp == 0 {
            break;
        }
        square = matmul(&square, &square)?;
    }

    result.ok_or_else(|| Error::Internal("matrix_power accumulated no factor".to_string()))
}
