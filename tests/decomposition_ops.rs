//! Decomposition primitives: cholesky, lu, qr, eigh, svd

mod common;

use common::*;
use linr::linalg::{
    self, cholesky, eigh, lu, pinv_with, qr, svd, svd_with, Decomposer, EighOpts, LuOpts,
    PinvOpts, QrMode, QrOpts, SvdOpts,
};
use linr::prelude::*;
use num_complex::Complex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn tight_eigh() -> EighOpts {
    EighOpts {
        max_iter: 200,
        eps: 1e-12,
    }
}

// ============================================================================
// Cholesky
// ============================================================================

#[test]
fn cholesky_literal_2x2() {
    let a = Tensor::from_slice(&[20.0f64, 17.6, 17.6, 16.0], &[2, 2]).unwrap();
    let l = cholesky(&a).unwrap();
    assert_allclose_f64(
        &l.to_vec::<f64>().unwrap(),
        &[4.472, 0.0, 3.935, 0.716],
        1e-3,
        1e-3,
        "cholesky factor of [[20, 17.6], [17.6, 16]]",
    );
}

#[test]
fn cholesky_batched_reconstructs() {
    let mut r = rng(7);
    let entries: Vec<Vec<f64>> = (0..3).map(|_| spd_matrix(&mut r, 4)).collect();
    let a = batch_tensor(&entries, &[4, 4]);

    let l = cholesky(&a).unwrap();
    assert_eq!(l.shape(), &[3, 4, 4]);

    let back = matmul(&l, &l.adjoint().unwrap()).unwrap();
    assert_allclose_f64(
        &back.to_vec::<f64>().unwrap(),
        &a.to_vec::<f64>().unwrap(),
        1e-10,
        1e-10,
        "L·Lᵀ per batch entry",
    );
}

#[test]
fn cholesky_complex_hermitian_reconstructs() {
    let data = [
        Complex::new(4.0f64, 0.0),
        Complex::new(1.0, -2.0),
        Complex::new(1.0, 2.0),
        Complex::new(6.0, 0.0),
    ];
    let a = Tensor::from_slice(&data, &[2, 2]).unwrap();
    let l = cholesky(&a).unwrap();
    assert_eq!(l.dtype(), DType::C128);

    let back = matmul(&l, &l.adjoint().unwrap())
        .unwrap()
        .to_vec::<Complex<f64>>()
        .unwrap();
    for (x, y) in back.iter().zip(data) {
        assert!((x.re - y.re).abs() < 1e-10, "{x} vs {y}");
        assert!((x.im - y.im).abs() < 1e-10, "{x} vs {y}");
    }
}

#[test]
fn cholesky_rejects_non_hermitian() {
    let a = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    let err = cholesky(&a).unwrap_err();
    assert!(err
        .to_string()
        .contains("matrix must be hermitian, a matrix is hermitian iff X = adjoint(X)"));
}

#[test]
fn cholesky_rejects_non_square() {
    let a = Tensor::zeros(&[3, 2], DType::F64);
    let err = cholesky(&a).unwrap_err();
    assert!(err.to_string().contains(
        "cholesky/1 expects a square matrix or a batch of square matrices, \
         got tensor with shape: [3, 2]"
    ));
}

// ============================================================================
// LU
// ============================================================================

#[test]
fn lu_batched_reconstructs() {
    let mut r = rng(11);
    let entries: Vec<Vec<f64>> = (0..4).map(|_| random_entries(&mut r, 16)).collect();
    let a = batch_tensor(&entries, &[4, 4]);

    let (p, l, u) = lu(&a, &LuOpts::default()).unwrap();
    let back = matmul(&matmul(&p, &l).unwrap(), &u).unwrap();
    assert_allclose_f64(
        &back.to_vec::<f64>().unwrap(),
        &a.to_vec::<f64>().unwrap(),
        1e-10,
        1e-10,
        "P·L·U per batch entry",
    );
}

#[test]
fn lu_unit_lower_and_upper_structure() {
    let a = Tensor::from_slice(&[2.0f64, 1.0, 4.0, 3.0], &[2, 2]).unwrap();
    let (_p, l, u) = lu(&a, &LuOpts::default()).unwrap();
    let l_data = l.to_vec::<f64>().unwrap();
    let u_data = u.to_vec::<f64>().unwrap();
    assert_eq!(l_data[0], 1.0);
    assert_eq!(l_data[3], 1.0);
    assert_eq!(l_data[1], 0.0);
    assert_eq!(u_data[2], 0.0);
}

#[test]
fn lu_degenerate_input_keeps_zero_diagonal() {
    // Rank-1 matrix: no error, U carries a (near-)zero diagonal entry
    let a = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 6.0], &[2, 2]).unwrap();
    let (p, l, u) = lu(&a, &LuOpts::default()).unwrap();
    let u_data = u.to_vec::<f64>().unwrap();
    assert!(u_data[3].abs() <= 1e-10);

    let back = matmul(&matmul(&p, &l).unwrap(), &u).unwrap();
    assert_allclose_f64(
        &back.to_vec::<f64>().unwrap(),
        &[1.0, 2.0, 3.0, 6.0],
        1e-10,
        1e-10,
        "degenerate P·L·U",
    );
}

// ============================================================================
// QR
// ============================================================================

#[test]
fn qr_batched_tall_reconstructs() {
    let mut r = rng(13);
    let entries: Vec<Vec<f64>> = (0..3).map(|_| random_entries(&mut r, 5 * 3)).collect();
    let a = batch_tensor(&entries, &[5, 3]);

    let (q, rt) = qr(&a, &QrOpts::default()).unwrap();
    assert_eq!(q.shape(), &[3, 5, 3]);
    assert_eq!(rt.shape(), &[3, 3, 3]);

    let back = matmul(&q, &rt).unwrap();
    assert_allclose_f64(
        &back.to_vec::<f64>().unwrap(),
        &a.to_vec::<f64>().unwrap(),
        1e-10,
        1e-10,
        "Q·R per batch entry",
    );

    // Qᵀ·Q = I for every entry
    let qtq = matmul(&q.adjoint().unwrap(), &q).unwrap();
    let eye = Tensor::identity(&[3], 3, DType::F64);
    assert_allclose_f64(
        &qtq.to_vec::<f64>().unwrap(),
        &eye.to_vec::<f64>().unwrap(),
        1e-10,
        1e-10,
        "orthonormal Q columns",
    );
}

#[test]
fn qr_complete_mode_shapes() {
    let mut r = rng(17);
    let a = Tensor::from_slice(&random_entries(&mut r, 4 * 2), &[4, 2]).unwrap();
    let opts = QrOpts {
        mode: QrMode::Complete,
        ..QrOpts::default()
    };
    let (q, rt) = qr(&a, &opts).unwrap();
    assert_eq!(q.shape(), &[4, 4]);
    assert_eq!(rt.shape(), &[4, 2]);

    let back = matmul(&q, &rt).unwrap();
    assert_allclose_f64(
        &back.to_vec::<f64>().unwrap(),
        &a.to_vec::<f64>().unwrap(),
        1e-10,
        1e-10,
        "complete-mode Q·R",
    );

    let qtq = matmul(&q.adjoint().unwrap(), &q).unwrap();
    let eye = Tensor::identity(&[], 4, DType::F64);
    assert_allclose_f64(
        &qtq.to_vec::<f64>().unwrap(),
        &eye.to_vec::<f64>().unwrap(),
        1e-10,
        1e-10,
        "complete Q unitary",
    );
}

#[test]
fn qr_upper_triangular_r() {
    let mut r = rng(19);
    let a = Tensor::from_slice(&random_entries(&mut r, 16), &[4, 4]).unwrap();
    let (_q, rt) = qr(&a, &QrOpts::default()).unwrap();
    let r_data = rt.to_vec::<f64>().unwrap();
    for i in 0..4 {
        for j in 0..i {
            assert_eq!(r_data[i * 4 + j], 0.0, "R[{i},{j}] must be exactly zero");
        }
    }
}

#[test]
fn qr_rejects_wide_and_vector() {
    let wide = Tensor::zeros(&[2, 5], DType::F64);
    assert!(qr(&wide, &QrOpts::default()).is_err());

    let vector = Tensor::zeros(&[5], DType::F64);
    let err = qr(&vector, &QrOpts::default()).unwrap_err();
    assert!(err.to_string().contains("qr/2"));
}

// ============================================================================
// Eigh
// ============================================================================

#[test]
fn eigh_batched_reconstructs() {
    let mut r = rng(23);
    let entries: Vec<Vec<f64>> = (0..2).map(|_| spd_matrix(&mut r, 4)).collect();
    let a = batch_tensor(&entries, &[4, 4]);

    let (values, vectors) = eigh(&a, &tight_eigh()).unwrap();
    assert_eq!(values.shape(), &[2, 4]);
    assert_eq!(vectors.shape(), &[2, 4, 4]);

    // A ≈ V·diag(w)·Vᵀ per entry
    let w = values.to_vec::<f64>().unwrap();
    let mut diag = vec![0.0f64; 2 * 16];
    for b in 0..2 {
        for i in 0..4 {
            diag[b * 16 + i * 4 + i] = w[b * 4 + i];
        }
    }
    let diag = Tensor::from_slice(&diag, &[2, 4, 4]).unwrap();
    let back = matmul(
        &matmul(&vectors, &diag).unwrap(),
        &vectors.adjoint().unwrap(),
    )
    .unwrap();
    assert_allclose_f64(
        &back.to_vec::<f64>().unwrap(),
        &a.to_vec::<f64>().unwrap(),
        1e-8,
        1e-8,
        "V·diag(w)·Vᵀ per batch entry",
    );
}

#[test]
fn eigh_eigenpair_residual() {
    let a_data = [2.0f64, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0];
    let a = Tensor::from_slice(&a_data, &[3, 3]).unwrap();
    let (values, vectors) = eigh(&a, &tight_eigh()).unwrap();
    let w = values.to_vec::<f64>().unwrap();
    let v = vectors.to_vec::<f64>().unwrap();

    // ‖A·vᵢ - wᵢ·vᵢ‖ small for every eigenpair
    for i in 0..3 {
        for row in 0..3 {
            let mut av = 0.0;
            for col in 0..3 {
                av += a_data[row * 3 + col] * v[col * 3 + i];
            }
            let residual = av - w[i] * v[row * 3 + i];
            assert!(residual.abs() < 1e-8, "eigenpair {i} residual {residual}");
        }
    }
}

#[test]
fn eigh_max_iter_bound_is_not_an_error() {
    // One sweep on a matrix needing more is accepted approximate behavior
    let mut r = rng(29);
    let a = Tensor::from_slice(&spd_matrix(&mut r, 5), &[5, 5]).unwrap();
    let opts = EighOpts {
        max_iter: 1,
        eps: 1e-15,
    };
    assert!(eigh(&a, &opts).is_ok());
}

#[test]
fn eigh_rejects_non_hermitian() {
    let a = Tensor::from_slice(&[1.0f64, 2.0, 0.0, 1.0], &[2, 2]).unwrap();
    assert!(eigh(&a, &EighOpts::default())
        .unwrap_err()
        .to_string()
        .contains("must be hermitian"));
}

// ============================================================================
// SVD
// ============================================================================

#[test]
fn svd_batched_reconstructs_descending() {
    let mut r = rng(31);
    let entries: Vec<Vec<f64>> = (0..3).map(|_| random_entries(&mut r, 4 * 3)).collect();
    let a = batch_tensor(&entries, &[4, 3]);

    let (u, s, vt) = svd(&a, &SvdOpts::default()).unwrap();
    assert_eq!(u.shape(), &[3, 4, 3]);
    assert_eq!(s.shape(), &[3, 3]);
    assert_eq!(vt.shape(), &[3, 3, 3]);

    let s_data = s.to_vec::<f64>().unwrap();
    for entry in s_data.chunks(3) {
        assert!(entry[0] >= entry[1] && entry[1] >= entry[2], "S not sorted");
        assert!(entry.iter().all(|v| *v >= 0.0));
    }

    assert_allclose_f64(
        &svd_reconstruct(&u, &s, &vt),
        &a.to_vec::<f64>().unwrap(),
        1e-8,
        1e-8,
        "U·diag(S)·Vᵗ per batch entry",
    );
}

#[test]
fn svd_wide_matrix() {
    let a_data = [1.0f64, 2.0, 0.0, 0.0, 1.0, 1.0];
    let a = Tensor::from_slice(&a_data, &[2, 3]).unwrap();
    let (u, s, vt) = svd(&a, &SvdOpts::default()).unwrap();
    assert_eq!(u.shape(), &[2, 2]);
    assert_eq!(vt.shape(), &[2, 3]);
    assert_allclose_f64(
        &svd_reconstruct(&u, &s, &vt),
        &a_data,
        1e-8,
        1e-8,
        "wide-matrix reconstruction",
    );
}

#[test]
fn svd_rank_deficient_has_zero_singular_value() {
    let a = Tensor::from_slice(&[1.0f64, 2.0, 2.0, 4.0], &[2, 2]).unwrap();
    let (_u, s, _vt) = svd(&a, &SvdOpts::default()).unwrap();
    let s_data = s.to_vec::<f64>().unwrap();
    assert!(s_data[1].abs() < 1e-10);
}

#[test]
fn svd_complex_not_implemented() {
    let a = Tensor::zeros(&[3, 3], DType::C128);
    let err = svd(&a, &SvdOpts::default()).unwrap_err();
    assert!(err.to_string().contains("not implemented"));
}

// ============================================================================
// Decomposer capability substitution
// ============================================================================

/// Counts SVD calls, delegating the math to the reference strategy
struct CountingDecomposer {
    svd_calls: AtomicUsize,
}

impl Decomposer for CountingDecomposer {
    fn cholesky(&self, a: &Tensor) -> Result<Tensor> {
        ReferenceDecomposer.cholesky(a)
    }
    fn lu(&self, a: &Tensor, opts: &LuOpts) -> Result<(Tensor, Tensor, Tensor)> {
        ReferenceDecomposer.lu(a, opts)
    }
    fn qr(&self, a: &Tensor, opts: &QrOpts) -> Result<(Tensor, Tensor)> {
        ReferenceDecomposer.qr(a, opts)
    }
    fn eigh(&self, a: &Tensor, opts: &EighOpts) -> Result<(Tensor, Tensor)> {
        ReferenceDecomposer.eigh(a, opts)
    }
    fn svd(&self, a: &Tensor, opts: &SvdOpts) -> Result<(Tensor, Tensor, Tensor)> {
        self.svd_calls.fetch_add(1, Ordering::SeqCst);
        ReferenceDecomposer.svd(a, opts)
    }
}

#[test]
fn injected_strategy_serves_derived_operations() {
    let strategy = CountingDecomposer {
        svd_calls: AtomicUsize::new(0),
    };
    let a = Tensor::from_slice(&[3.0f64, 0.0, 0.0, 2.0], &[2, 2]).unwrap();

    let direct = svd_with(&a, &SvdOpts::default(), &strategy).unwrap();
    assert_eq!(strategy.svd_calls.load(Ordering::SeqCst), 1);
    assert!(direct.1.to_vec::<f64>().unwrap()[0] >= 2.0);

    let p = pinv_with(&a, &PinvOpts::default(), &strategy).unwrap();
    assert_eq!(strategy.svd_calls.load(Ordering::SeqCst), 2);
    assert_allclose_f64(
        &p.to_vec::<f64>().unwrap(),
        &[1.0 / 3.0, 0.0, 0.0, 0.5],
        1e-10,
        1e-10,
        "pinv through injected strategy",
    );

    let rank = linalg::matrix_rank_with(&a, &linalg::RankOpts::default(), &strategy).unwrap();
    assert_eq!(strategy.svd_calls.load(Ordering::SeqCst), 3);
    assert_eq!(rank.to_vec::<i64>().unwrap(), vec![2]);
}
