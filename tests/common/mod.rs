//! Common test utilities
#![allow(dead_code)]

use linr::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Deterministic RNG for reproducible matrix fixtures
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Uniform random entries in [-1, 1)
pub fn random_entries(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect()
}

/// A random symmetric positive-definite n×n matrix: B·Bᵀ + n·I
pub fn spd_matrix(rng: &mut StdRng, n: usize) -> Vec<f64> {
    let b = random_entries(rng, n * n);
    let mut a = vec![0.0f64; n * n];
    for i in 0..n {
        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..n {
                sum += b[i * n + k] * b[j * n + k];
            }
            a[i * n + j] = sum;
        }
        a[i * n + i] += n as f64;
    }
    a
}

/// A random diagonally dominant (hence invertible) n×n matrix
pub fn invertible_matrix(rng: &mut StdRng, n: usize) -> Vec<f64> {
    let mut a = random_entries(rng, n * n);
    for i in 0..n {
        a[i * n + i] += n as f64 + 1.0;
    }
    a
}

/// Flatten a batch of per-entry matrices into one tensor
pub fn batch_tensor(entries: &[Vec<f64>], entry_shape: &[usize]) -> Tensor {
    let data: Vec<f64> = entries.concat();
    let shape: Vec<usize> = [entries.len()]
        .into_iter()
        .chain(entry_shape.iter().copied())
        .collect();
    Tensor::from_slice(&data, &shape).expect("batch fixture shape")
}

/// Reconstruct U·diag(S)·Vᵗ for one unbatched decomposition
pub fn svd_reconstruct(u: &Tensor, s: &Tensor, vt: &Tensor) -> Vec<f64> {
    let k = s.shape()[s.ndim() - 1];
    let batch: usize = s.shape()[..s.ndim() - 1].iter().product();
    let s_data = s.to_vec::<f64>().expect("singular values dtype");
    let mut diag = vec![0.0f64; batch * k * k];
    for b in 0..batch {
        for i in 0..k {
            diag[b * k * k + i * k + i] = s_data[b * k + i];
        }
    }
    let shape: Vec<usize> = s.shape()[..s.ndim() - 1]
        .iter()
        .copied()
        .chain([k, k])
        .collect();
    let diag = Tensor::from_slice(&diag, &shape).expect("diag fixture");
    matmul(&matmul(u, &diag).expect("u·s"), vt)
        .expect("u·s·vt")
        .to_vec::<f64>()
        .expect("reconstruction dtype")
}
