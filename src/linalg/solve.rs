//! General solve via QR, and matrix inversion

use super::triangular::substitute;
use super::{QrOpts, qr};
use crate::dtype::{DType, LinalgScalar};
use crate::error::{Error, Result};
use crate::ops::matmul;
use crate::resolve;
use crate::tensor::Tensor;
use num_complex::Complex;
use rayon::prelude::*;

/// Solve `A · X = B` for a batch of square `A`
///
/// `B` is a matching batch of square matrices or vectors. The system is
/// solved through the QR factorization (`A = Q·R`, then `R·X = Qᴴ·B` by
/// back substitution), which conditions better than elimination-based
/// solving when `A` is ill-conditioned. Singular `A` surfaces as
/// [`Error::SingularMatrix`] from the triangular stage.
pub fn solve(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let tpl = resolve::solve(a.shape(), a.dtype(), b.shape(), b.dtype())?;
    let a = a.cast(tpl.dtype)?;
    let b = b.cast(tpl.dtype)?;

    let (q, r) = qr(&a, &QrOpts::default())?;
    let qh = q.adjoint()?;

    let vector_rhs = b.ndim() + 1 == a.ndim();
    let n = a.shape()[a.ndim() - 1];
    let rhs = if vector_rhs {
        let mut shape: Vec<usize> = b.shape().to_vec();
        shape.push(1);
        matmul(&qh, &b.reshape(shape)?)?
    } else {
        matmul(&qh, &b)?
    };

    let x = match tpl.dtype {
        DType::F32 => back_substitute::<f32>(&r, &rhs, n)?,
        DType::F64 => back_substitute::<f64>(&r, &rhs, n)?,
        DType::C64 => back_substitute::<Complex<f32>>(&r, &rhs, n)?,
        DType::C128 => back_substitute::<Complex<f64>>(&r, &rhs, n)?,
        other => {
            return Err(Error::Internal(format!(
                "solve dispatched on unpromoted dtype {other}"
            )))
        }
    };
    x.reshape(&tpl.shape)
}

/// Invert a batch of square matrices
///
/// Defined as `solve(A, I)` with the identity broadcast to `A`'s batch
/// shape. The closed-form gradient of this operation is registered in
/// [`crate::grad::GradRegistry`].
pub fn invert(a: &Tensor) -> Result<Tensor> {
    let tpl = resolve::invert(a.shape(), a.dtype())?;
    let n = a.shape()[a.ndim() - 1];
    let eye = Tensor::identity(a.dims().batch_dims(), n, tpl.dtype);
    solve(a, &eye)
}

/// Batched upper-triangular back substitution of `R·X = Y`
fn back_substitute<T: LinalgScalar>(r: &Tensor, y: &Tensor, n: usize) -> Result<Tensor> {
    let ncols = y.shape()[y.ndim() - 1];
    let batch = r.dims().batch_size();
    let r_data = r.data::<T>()?;
    let y_data = y.data::<T>()?;
    if y_data.is_empty() {
        return Ok(y.clone());
    }

    let entries: Vec<Vec<T>> = (0..batch)
        .into_par_iter()
        .map(|bi| {
            substitute(
                &r_data[bi * n * n..(bi + 1) * n * n],
                &y_data[bi * n * ncols..(bi + 1) * n * ncols],
                n,
                ncols,
                false,
            )
        })
        .collect::<Result<Vec<_>>>()?;
    Tensor::from_vec(entries.concat(), y.shape())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_vector() {
        // [[2, 1], [1, 2]] x = [3, 3] -> x = [1, 1]
        let a = Tensor::from_slice(&[2.0f64, 1.0, 1.0, 2.0], &[2, 2]).unwrap();
        let b = Tensor::from_slice(&[3.0f64, 3.0], &[2]).unwrap();
        let x = solve(&a, &b).unwrap();
        let data = x.to_vec::<f64>().unwrap();
        assert!((data[0] - 1.0).abs() < 1e-10);
        assert!((data[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_solve_singular_raises() {
        let a = Tensor::from_slice(&[1.0f64, 2.0, 2.0, 4.0], &[2, 2]).unwrap();
        let b = Tensor::from_slice(&[1.0f64, 1.0], &[2]).unwrap();
        assert!(matches!(solve(&a, &b), Err(Error::SingularMatrix)));
    }

    #[test]
    fn test_invert_2x2() {
        // [[4, 7], [2, 6]]⁻¹ = [[0.6, -0.7], [-0.2, 0.4]]
        let a = Tensor::from_slice(&[4.0f64, 7.0, 2.0, 6.0], &[2, 2]).unwrap();
        let inv = invert(&a).unwrap();
        let data = inv.to_vec::<f64>().unwrap();
        for (x, y) in data.iter().zip([0.6, -0.7, -0.2, 0.4]) {
            assert!((x - y).abs() < 1e-10, "{x} vs {y}");
        }
    }

    #[test]
    fn test_invert_rejects_non_square() {
        let a = Tensor::zeros(&[2, 3], DType::F64);
        let err = invert(&a).unwrap_err();
        assert!(err.to_string().contains("invert/1"));
    }
}
