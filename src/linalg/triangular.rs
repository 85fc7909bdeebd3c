//! Triangular solve via batched forward/back substitution

use super::{Transform, TriangularOpts, DEFAULT_EPS};
use crate::dtype::{DType, LinalgScalar};
use crate::error::{Error, Result};
use crate::resolve;
use crate::tensor::Tensor;
use num_complex::Complex;
use rayon::prelude::*;

/// Solve `op(A) · X = B` (or `X · op(A) = B` when `left_side` is false)
/// where `A` is triangular
///
/// The `lower` flag selects which half of `A` holds the factor; the other
/// half is ignored. `op(A)` is `A` or `Aᵗ` per `transform` (`Conjugate` is
/// documented but unsupported). `B` is a matching batch of square matrices
/// or vectors. Substitution costs O(n²) per right-hand-side column instead
/// of the O(n³) of a general solve. A (near-)zero diagonal divisor raises
/// [`Error::SingularMatrix`].
pub fn triangular_solve(a: &Tensor, b: &Tensor, opts: &TriangularOpts) -> Result<Tensor> {
    if opts.transform == Transform::Conjugate {
        return Err(Error::not_implemented(
            "conjugate transform for triangular_solve",
        ));
    }
    let tpl = resolve::triangular_solve(a.shape(), a.dtype(), b.shape(), b.dtype())?;
    let a = a.cast(tpl.dtype)?;
    let b = b.cast(tpl.dtype)?;
    match tpl.dtype {
        DType::F32 => run::<f32>(&a, &b, opts, &tpl),
        DType::F64 => run::<f64>(&a, &b, opts, &tpl),
        DType::C64 => run::<Complex<f32>>(&a, &b, opts, &tpl),
        DType::C128 => run::<Complex<f64>>(&a, &b, opts, &tpl),
        other => Err(Error::Internal(format!(
            "triangular_solve dispatched on unpromoted dtype {other}"
        ))),
    }
}

fn run<T: LinalgScalar>(
    a: &Tensor,
    b: &Tensor,
    opts: &TriangularOpts,
    tpl: &resolve::Template,
) -> Result<Tensor> {
    let n = a.shape()[a.ndim() - 1];
    let vector_rhs = b.ndim() + 1 == a.ndim();
    let a_data = a.data::<T>()?;
    let b_data = b.data::<T>()?;
    if b_data.is_empty() {
        return Ok(Tensor::zeros(&tpl.shape, tpl.dtype));
    }
    let batch = a.dims().batch_size();
    let b_entry = if vector_rhs { n } else { n * n };

    let entries: Vec<Vec<T>> = (0..batch)
        .into_par_iter()
        .map(|bi| {
            triangular_entry(
                &a_data[bi * n * n..(bi + 1) * n * n],
                &b_data[bi * b_entry..(bi + 1) * b_entry],
                n,
                vector_rhs,
                opts,
            )
        })
        .collect::<Result<Vec<_>>>()?;
    Tensor::from_vec(entries.concat(), &tpl.shape)
}

fn triangular_entry<T: LinalgScalar>(
    a: &[T],
    b: &[T],
    n: usize,
    vector_rhs: bool,
    opts: &TriangularOpts,
) -> Result<Vec<T>> {
    // Extract the selected triangle; the other half of A carries no meaning
    let mut t = vec![T::zero(); n * n];
    for i in 0..n {
        let (lo, hi) = if opts.lower { (0, i + 1) } else { (i, n) };
        for j in lo..hi {
            t[i * n + j] = a[i * n + j];
        }
    }

    // A right-side solve X·op(A) = B transposes into op(A)ᵗ·Xᵗ = Bᵗ, so the
    // two transpositions compose
    let transform_t = opts.transform == Transform::Transpose;
    let do_transpose = transform_t != !opts.left_side;
    if do_transpose {
        t = transpose_square(&t, n);
    }
    let eff_lower = opts.lower != do_transpose;

    let (rhs, ncols) = if vector_rhs {
        (b.to_vec(), 1)
    } else if opts.left_side {
        (b.to_vec(), n)
    } else {
        (transpose_square(b, n), n)
    };

    let x = substitute(&t, &rhs, n, ncols, eff_lower)?;

    Ok(if !opts.left_side && !vector_rhs {
        transpose_square(&x, n)
    } else {
        x
    })
}

/// Forward (lower) or backward (upper) substitution on one batch entry,
/// for an `n × ncols` right-hand side
pub(crate) fn substitute<T: LinalgScalar>(
    t: &[T],
    rhs: &[T],
    n: usize,
    ncols: usize,
    lower: bool,
) -> Result<Vec<T>> {
    let mut x = vec![T::zero(); n * ncols];
    for col in 0..ncols {
        let mut order: Box<dyn Iterator<Item = usize>> = if lower {
            Box::new(0..n)
        } else {
            Box::new((0..n).rev())
        };
        order.try_for_each(|i| -> Result<()> {
            let mut sum = T::zero();
            let (lo, hi) = if lower { (0, i) } else { (i + 1, n) };
            for j in lo..hi {
                sum = sum + t[i * n + j] * x[j * ncols + col];
            }
            let diag = t[i * n + i];
            if diag.abs() <= DEFAULT_EPS {
                return Err(Error::SingularMatrix);
            }
            x[i * ncols + col] = (rhs[i * ncols + col] - sum) / diag;
            Ok(())
        })?;
    }
    Ok(x)
}

fn transpose_square<T: LinalgScalar>(data: &[T], n: usize) -> Vec<T> {
    let mut out = vec![T::zero(); n * n];
    for i in 0..n {
        for j in 0..n {
            out[j * n + i] = data[i * n + j];
        }
    }
    out
}
