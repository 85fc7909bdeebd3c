//! Vector and matrix norms

use super::{Decomposer, NormOpts, NormOrd, ReferenceDecomposer, SvdOpts};
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::resolve;
use crate::tensor::Tensor;

/// Norm of a vector (1-D) or matrix (2-D) tensor
///
/// Dispatches on the order and the tensor rank:
///
/// | ord          | vector (1-D)             | matrix (2-D)             |
/// |--------------|--------------------------|--------------------------|
/// | default / 2  | Euclidean                | Frobenius                |
/// | 0            | count of non-zeros       | unsupported              |
/// | 1            | Manhattan                | max column absolute-sum  |
/// | -1           | general p                | min column absolute-sum  |
/// | inf / -inf   | max / min absolute value | max / min row abs-sum    |
/// | frobenius    | error (requires 2-D)     | sqrt of sum of squares   |
/// | nuclear      | error (requires 2-D)     | sum of singular values   |
/// | -2           | general p                | smallest singular value  |
/// | other int p  | stabilized p-norm        | unsupported              |
///
/// The result is a real scalar tensor. Batched input is not supported here;
/// higher ranks fail with a shape error.
pub fn norm(a: &Tensor, opts: &NormOpts) -> Result<Tensor> {
    norm_with(a, opts, &ReferenceDecomposer)
}

/// [`norm`] with a caller-supplied decomposition strategy for the
/// singular-value-based orders
pub fn norm_with<D: Decomposer + ?Sized>(
    a: &Tensor,
    opts: &NormOpts,
    decomposer: &D,
) -> Result<Tensor> {
    if opts.axes.is_some() {
        return Err(Error::not_implemented("norm with explicit axes"));
    }
    let tpl = resolve::norm(a.shape(), a.dtype())?;
    let abs = a.abs_values();

    let value = if a.ndim() == 1 {
        vector_norm(&abs, opts.ord)?
    } else {
        matrix_norm(a, &abs, opts.ord, decomposer)?
    };

    match tpl.dtype {
        DType::F32 => Tensor::from_slice(&[value as f32], &[]),
        _ => Tensor::from_slice(&[value], &[]),
    }
}

fn vector_norm(abs: &[f64], ord: Option<NormOrd>) -> Result<f64> {
    match ord {
        None | Some(NormOrd::P(2)) => Ok(abs.iter().map(|v| v * v).sum::<f64>().sqrt()),
        Some(NormOrd::P(0)) => Ok(abs.iter().filter(|v| **v != 0.0).count() as f64),
        Some(NormOrd::P(1)) => Ok(abs.iter().sum()),
        Some(NormOrd::Inf) => Ok(abs.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
        Some(NormOrd::NegInf) => Ok(abs.iter().cloned().fold(f64::INFINITY, f64::min)),
        Some(NormOrd::Frobenius) => Err(Error::shape(
            "frobenius norm expects a 2-D tensor, got a 1-D tensor",
        )),
        Some(NormOrd::Nuclear) => Err(Error::shape(
            "nuclear norm expects a 2-D tensor, got a 1-D tensor",
        )),
        Some(NormOrd::P(p)) => Ok(stabilized_p_norm(abs, p)),
    }
}

/// `(Σ|xᵢ|^p)^(1/p)`, scaled by the largest magnitude so that raising to
/// large or negative powers cannot overflow
fn stabilized_p_norm(abs: &[f64], p: i64) -> f64 {
    let mut max = abs.iter().cloned().fold(0.0f64, f64::max);
    if max == 0.0 {
        max = 1.0;
    }
    let p = p as f64;
    let sum: f64 = abs.iter().map(|v| (v / max).powf(p)).sum();
    max * sum.powf(1.0 / p)
}

fn matrix_norm<D: Decomposer + ?Sized>(
    a: &Tensor,
    abs: &[f64],
    ord: Option<NormOrd>,
    decomposer: &D,
) -> Result<f64> {
    let m = a.shape()[0];
    let n = a.shape()[1];
    match ord {
        None | Some(NormOrd::P(2)) | Some(NormOrd::Frobenius) => {
            Ok(abs.iter().map(|v| v * v).sum::<f64>().sqrt())
        }
        Some(NormOrd::P(1)) => Ok(column_sums(abs, m, n)
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max)),
        Some(NormOrd::P(-1)) => Ok(column_sums(abs, m, n)
            .into_iter()
            .fold(f64::INFINITY, f64::min)),
        Some(NormOrd::Inf) => Ok(row_sums(abs, m, n)
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max)),
        Some(NormOrd::NegInf) => Ok(row_sums(abs, m, n)
            .into_iter()
            .fold(f64::INFINITY, f64::min)),
        Some(NormOrd::Nuclear) => Ok(singular_values(a, decomposer)?.iter().sum()),
        Some(NormOrd::P(-2)) => {
            let s = singular_values(a, decomposer)?;
            Ok(s.last().copied().unwrap_or(0.0))
        }
        Some(NormOrd::P(p)) => Err(Error::unsupported_option(
            "ord",
            format!("{p} for 2-D tensors"),
        )),
    }
}

fn column_sums(abs: &[f64], m: usize, n: usize) -> Vec<f64> {
    let mut sums = vec![0.0f64; n];
    for i in 0..m {
        for j in 0..n {
            sums[j] += abs[i * n + j];
        }
    }
    sums
}

fn row_sums(abs: &[f64], m: usize, n: usize) -> Vec<f64> {
    (0..m)
        .map(|i| abs[i * n..(i + 1) * n].iter().sum())
        .collect()
}

/// Descending singular values via the injected strategy
fn singular_values<D: Decomposer + ?Sized>(a: &Tensor, decomposer: &D) -> Result<Vec<f64>> {
    let (_u, s, _vt) = decomposer.svd(a, &SvdOpts::default())?;
    let s = s.cast(DType::F64)?;
    s.to_vec::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{NormOpts, NormOrd};

    fn scalar(t: &Tensor) -> f64 {
        t.to_vec::<f64>().unwrap()[0]
    }

    fn ord(ord: NormOrd) -> NormOpts {
        NormOpts {
            ord: Some(ord),
            axes: None,
        }
    }

    #[test]
    fn test_vector_euclidean_default() {
        let v = Tensor::from_slice(&[3.0f64, 4.0], &[2]).unwrap();
        assert!((scalar(&norm(&v, &NormOpts::default()).unwrap()) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_vector_zero_counts() {
        let v = Tensor::from_slice(&[1.0f64, 0.0, -2.0, 0.0], &[4]).unwrap();
        assert_eq!(scalar(&norm(&v, &ord(NormOrd::P(0))).unwrap()), 2.0);
    }

    #[test]
    fn test_matrix_frobenius_default() {
        let m = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        assert!((scalar(&norm(&m, &NormOpts::default()).unwrap()) - 30.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_one_norm_is_max_column_sum() {
        let m = Tensor::from_slice(&[1.0f64, -7.0, 2.0, 3.0], &[2, 2]).unwrap();
        assert_eq!(scalar(&norm(&m, &ord(NormOrd::P(1))).unwrap()), 10.0);
        assert_eq!(scalar(&norm(&m, &ord(NormOrd::P(-1))).unwrap()), 3.0);
    }

    #[test]
    fn test_frobenius_rejects_vector() {
        let v = Tensor::from_slice(&[1.0f64, 2.0], &[2]).unwrap();
        assert!(norm(&v, &ord(NormOrd::Frobenius)).is_err());
    }

    #[test]
    fn test_axes_not_implemented() {
        let v = Tensor::from_slice(&[1.0f64, 2.0], &[2]).unwrap();
        let opts = NormOpts {
            ord: None,
            axes: Some(vec![0]),
        };
        assert!(matches!(
            norm(&v, &opts),
            Err(Error::NotImplemented { .. })
        ));
    }
}
