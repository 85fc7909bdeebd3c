//! Numerical matrix rank

use super::{Decomposer, RankOpts, ReferenceDecomposer, SvdOpts};
use crate::dtype::DType;
use crate::error::Result;
use crate::resolve;
use crate::tensor::Tensor;

/// Numerical rank of a batch of matrices
///
/// Counts the singular values strictly greater than
/// `eps · max(m, n) · max(singular values)` per batch entry. Returns an
/// `i64` tensor shaped like the batch (a scalar for a single matrix).
pub fn matrix_rank(a: &Tensor, opts: &RankOpts) -> Result<Tensor> {
    matrix_rank_with(a, opts, &ReferenceDecomposer)
}

/// [`matrix_rank`] with a caller-supplied decomposition strategy
pub fn matrix_rank_with<D: Decomposer + ?Sized>(
    a: &Tensor,
    opts: &RankOpts,
    decomposer: &D,
) -> Result<Tensor> {
    let tpl = resolve::matrix_rank(a.shape(), a.dtype())?;
    let ndim = a.ndim();
    let m = a.shape()[ndim - 2];
    let n = a.shape()[ndim - 1];
    let k = m.min(n);

    if k == 0 {
        let batch = a.dims().batch_size();
        return Tensor::from_vec(vec![0i64; batch], &tpl.shape);
    }

    let (_u, s, _vt) = decomposer.svd(a, &SvdOpts::default())?;
    let s = s.cast(DType::F64)?;
    let s_data = s.data::<f64>()?;

    let ranks: Vec<i64> = s_data
        .chunks(k)
        .map(|entry| {
            let s_max = entry.iter().cloned().fold(0.0f64, f64::max);
            let tol = opts.eps * m.max(n) as f64 * s_max;
            entry.iter().filter(|sv| **sv > tol).count() as i64
        })
        .collect();
    Tensor::from_vec(ranks, &tpl.shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::RankOpts;

    #[test]
    fn test_rank_full() {
        let a = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let r = matrix_rank(&a, &RankOpts::default()).unwrap();
        assert_eq!(r.dtype(), DType::I64);
        assert_eq!(r.to_vec::<i64>().unwrap(), vec![2]);
    }

    #[test]
    fn test_rank_deficient() {
        let a = Tensor::from_slice(&[1.0f64, 2.0, 2.0, 4.0], &[2, 2]).unwrap();
        assert_eq!(
            matrix_rank(&a, &RankOpts::default())
                .unwrap()
                .to_vec::<i64>()
                .unwrap(),
            vec![1]
        );
    }

    #[test]
    fn test_rank_rejects_vector() {
        let a = Tensor::from_slice(&[1.0f64, 2.0], &[2]).unwrap();
        let err = matrix_rank(&a, &RankOpts::default()).unwrap_err();
        assert!(err.to_string().contains("matrix_rank/2"));
    }
}
