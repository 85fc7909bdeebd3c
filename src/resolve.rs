//! Shape/type resolver: validate and predict results before computation
//!
//! The resolver is a set of pure functions mapping input shapes and dtypes to
//! output [`Template`]s. It validates rank, squareness, and batch-dimension
//! compatibility, and computes the promoted floating/complex result type,
//! all without materializing any data. Every operation in
//! [`crate::linalg`] runs its resolver first, so shape errors are always
//! cheap to detect and never trigger partial numeric work.

use crate::dtype::{promote, to_floating, DType};
use crate::error::{Error, Result};
use crate::linalg::QrMode;
use crate::tensor::Shape;

/// Shape + dtype descriptor with no backing data
///
/// Produced by the resolver ahead of backend dispatch; execution then fills a
/// tensor matching the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Output shape
    pub shape: Shape,
    /// Output element type
    pub dtype: DType,
}

impl Template {
    /// Create a template from a shape and dtype
    pub fn new(shape: impl Into<Shape>, dtype: DType) -> Self {
        Self {
            shape: shape.into(),
            dtype,
        }
    }
}

/// Operation identity for the unified [`resolve`] entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Cholesky factorization
    Cholesky,
    /// LU factorization with partial pivoting
    Lu,
    /// QR factorization in the given mode
    Qr(QrMode),
    /// Symmetric/Hermitian eigendecomposition
    Eigh,
    /// Singular value decomposition
    Svd,
    /// Triangular solve
    TriangularSolve,
    /// General solve
    Solve,
    /// Matrix inversion
    Invert,
    /// Determinant
    Determinant,
    /// Integer matrix power
    MatrixPower,
    /// Vector/matrix norm
    Norm,
    /// Moore-Penrose pseudo-inverse
    Pinv,
    /// Numerical matrix rank
    MatrixRank,
}

/// Resolve the output templates of an operation from input shapes and dtypes
///
/// Single-input operations take one shape/dtype pair; `TriangularSolve` and
/// `Solve` take two (`A` then `B`). Returns the templates of every output in
/// the operation's declared order (e.g. `P, L, U` for LU).
pub fn resolve(op: Op, shapes: &[&[usize]], dtypes: &[DType]) -> Result<Vec<Template>> {
    let expected = match op {
        Op::TriangularSolve | Op::Solve => 2,
        _ => 1,
    };
    if shapes.len() != expected || dtypes.len() != expected {
        return Err(Error::Internal(format!(
            "resolve({op:?}) expects {expected} inputs, got {} shapes and {} dtypes",
            shapes.len(),
            dtypes.len()
        )));
    }
    match op {
        Op::Cholesky => Ok(vec![cholesky(shapes[0], dtypes[0])?]),
        Op::Lu => {
            let (p, l, u) = lu(shapes[0], dtypes[0])?;
            Ok(vec![p, l, u])
        }
        Op::Qr(mode) => {
            let (q, r) = qr(shapes[0], dtypes[0], mode)?;
            Ok(vec![q, r])
        }
        Op::Eigh => {
            let (values, vectors) = eigh(shapes[0], dtypes[0])?;
            Ok(vec![values, vectors])
        }
        Op::Svd => {
            let (u, s, vt) = svd(shapes[0], dtypes[0])?;
            Ok(vec![u, s, vt])
        }
        Op::TriangularSolve => Ok(vec![triangular_solve(
            shapes[0], dtypes[0], shapes[1], dtypes[1],
        )?]),
        Op::Solve => Ok(vec![solve(shapes[0], dtypes[0], shapes[1], dtypes[1])?]),
        Op::Invert => Ok(vec![invert(shapes[0], dtypes[0])?]),
        Op::Determinant => Ok(vec![determinant(shapes[0], dtypes[0])?]),
        Op::MatrixPower => Ok(vec![matrix_power(shapes[0], dtypes[0])?]),
        Op::Norm => Ok(vec![norm(shapes[0], dtypes[0])?]),
        Op::Pinv => Ok(vec![pinv(shapes[0], dtypes[0])?]),
        Op::MatrixRank => Ok(vec![matrix_rank(shapes[0], dtypes[0])?]),
    }
}

/// Resolve `cholesky(A)`: same shape, promoted floating/complex dtype
pub fn cholesky(shape: &[usize], dtype: DType) -> Result<Template> {
    square_batched("cholesky", 1, shape)?;
    Ok(Template::new(shape, to_floating(dtype)))
}

/// Resolve `lu(A)`: `(P, L, U)` templates, all square like the input
pub fn lu(shape: &[usize], dtype: DType) -> Result<(Template, Template, Template)> {
    square_batched("lu", 2, shape)?;
    let dtype = to_floating(dtype);
    Ok((
        Template::new(shape, dtype),
        Template::new(shape, dtype),
        Template::new(shape, dtype),
    ))
}

/// Resolve `qr(A)`: `(Q, R)` templates per the requested mode
pub fn qr(shape: &[usize], dtype: DType, mode: QrMode) -> Result<(Template, Template)> {
    let (batch, m, n) = matrix_batched("qr", 2, shape)?;
    if m < n {
        return Err(Error::shape(format!(
            "expected a matrix with at least as many rows as columns, \
             got tensor with shape: {shape:?}"
        )));
    }
    let dtype = to_floating(dtype);
    let k = m.min(n);
    let (q_cols, r_rows) = match mode {
        QrMode::Reduced => (k, k),
        QrMode::Complete => (m, m),
    };
    Ok((
        Template::new(with_matrix(batch, m, q_cols), dtype),
        Template::new(with_matrix(batch, r_rows, n), dtype),
    ))
}

/// Resolve `eigh(A)`: `(eigenvalues, eigenvectors)` templates
///
/// Eigenvalues of a Hermitian matrix are real, so the value template carries
/// the real component dtype even for complex input.
pub fn eigh(shape: &[usize], dtype: DType) -> Result<(Template, Template)> {
    let (batch, n) = square_batched("eigh", 2, shape)?;
    let dtype = to_floating(dtype);
    let values: Shape = batch.iter().copied().chain([n]).collect();
    Ok((
        Template::new(values, dtype.real_component()),
        Template::new(shape, dtype),
    ))
}

/// Resolve `svd(A)`: `(U, S, Vᵗ)` templates of the reduced decomposition
///
/// Complex input is documented but unsupported in this core.
pub fn svd(shape: &[usize], dtype: DType) -> Result<(Template, Template, Template)> {
    let (batch, m, n) = matrix_batched("svd", 2, shape)?;
    if dtype.is_complex() {
        return Err(Error::not_implemented("svd for complex tensors"));
    }
    let dtype = to_floating(dtype);
    let k = m.min(n);
    let s: Shape = batch.iter().copied().chain([k]).collect();
    Ok((
        Template::new(with_matrix(batch, m, k), dtype),
        Template::new(s, dtype),
        Template::new(with_matrix(batch, k, n), dtype),
    ))
}

/// Resolve `triangular_solve(A, B)`: the solution matches `B`'s shape
pub fn triangular_solve(
    a_shape: &[usize],
    a_dtype: DType,
    b_shape: &[usize],
    b_dtype: DType,
) -> Result<Template> {
    rhs_template("triangular_solve", 3, a_shape, a_dtype, b_shape, b_dtype)
}

/// Resolve `solve(A, B)`: the solution matches `B`'s shape
pub fn solve(
    a_shape: &[usize],
    a_dtype: DType,
    b_shape: &[usize],
    b_dtype: DType,
) -> Result<Template> {
    rhs_template("solve", 2, a_shape, a_dtype, b_shape, b_dtype)
}

/// Resolve `invert(A)`: same shape, promoted dtype
pub fn invert(shape: &[usize], dtype: DType) -> Result<Template> {
    square_batched("invert", 1, shape)?;
    Ok(Template::new(shape, to_floating(dtype)))
}

/// Resolve `determinant(A)`: one scalar per batch entry
///
/// The result is promoted to a floating type even for integer input.
pub fn determinant(shape: &[usize], dtype: DType) -> Result<Template> {
    let (batch, _) = square_batched("determinant", 1, shape)?;
    Ok(Template::new(batch, to_floating(dtype)))
}

/// Resolve `matrix_power(A, k)`: same shape, promoted dtype
pub fn matrix_power(shape: &[usize], dtype: DType) -> Result<Template> {
    square_batched("matrix_power", 2, shape)?;
    Ok(Template::new(shape, to_floating(dtype)))
}

/// Resolve `norm(A)`: a real scalar; input must be 1-D or 2-D
pub fn norm(shape: &[usize], dtype: DType) -> Result<Template> {
    if !(1..=2).contains(&shape.len()) {
        return Err(Error::vector_or_matrix_expected(shape));
    }
    Ok(Template::new(
        Shape::new(),
        to_floating(dtype).real_component(),
    ))
}

/// Resolve `pinv(A)`: scalar/vector closed forms keep their shape, matrices
/// swap their trailing two axes
pub fn pinv(shape: &[usize], dtype: DType) -> Result<Template> {
    let out = to_floating(dtype);
    match shape.len() {
        0 | 1 => Ok(Template::new(shape, out)),
        _ => {
            if dtype.is_complex() {
                return Err(Error::not_implemented("pinv for complex tensors"));
            }
            let (batch, m, n) = matrix_batched("pinv", 2, shape)?;
            Ok(Template::new(with_matrix(batch, n, m), out))
        }
    }
}

/// Resolve `matrix_rank(A)`: one integer count per batch entry
pub fn matrix_rank(shape: &[usize], dtype: DType) -> Result<Template> {
    let (batch, _, _) = matrix_batched("matrix_rank", 2, shape)?;
    if dtype.is_complex() {
        return Err(Error::not_implemented("matrix_rank for complex tensors"));
    }
    Ok(Template::new(batch, DType::I64))
}

/// Resolve the batched matrix product `A · B`
pub fn matmul(
    a_shape: &[usize],
    a_dtype: DType,
    b_shape: &[usize],
    b_dtype: DType,
) -> Result<Template> {
    let (a_batch, m, ak) = matrix_batched("matmul", 2, a_shape)?;
    let (b_batch, bk, n) = matrix_batched("matmul", 2, b_shape)?;
    batches_match(a_batch, b_batch)?;
    if ak != bk {
        return Err(Error::shape(format!(
            "expected the inner matrix dimensions to match, \
             got tensors with shapes: {a_shape:?} and {b_shape:?}"
        )));
    }
    Ok(Template::new(
        with_matrix(a_batch, m, n),
        to_floating(promote(a_dtype, b_dtype)),
    ))
}

// ============================================================================
// Validation helpers
// ============================================================================

fn square_batched<'a>(
    op: &'static str,
    arity: usize,
    shape: &'a [usize],
) -> Result<(&'a [usize], usize)> {
    let ndim = shape.len();
    if ndim < 2 || shape[ndim - 2] != shape[ndim - 1] {
        return Err(Error::square_expected(op, arity, shape));
    }
    Ok((&shape[..ndim - 2], shape[ndim - 1]))
}

fn matrix_batched<'a>(
    op: &'static str,
    arity: usize,
    shape: &'a [usize],
) -> Result<(&'a [usize], usize, usize)> {
    let ndim = shape.len();
    if ndim < 2 {
        return Err(Error::matrix_expected(op, arity, shape));
    }
    Ok((&shape[..ndim - 2], shape[ndim - 2], shape[ndim - 1]))
}

fn batches_match(a: &[usize], b: &[usize]) -> Result<()> {
    if a != b {
        return Err(Error::shape(format!(
            "expected the batch dimensions of both operands to match exactly, \
             got {a:?} and {b:?}"
        )));
    }
    Ok(())
}

fn rhs_template(
    op: &'static str,
    arity: usize,
    a_shape: &[usize],
    a_dtype: DType,
    b_shape: &[usize],
    b_dtype: DType,
) -> Result<Template> {
    let (a_batch, n) = square_batched(op, arity, a_shape)?;
    let out_dtype = to_floating(promote(a_dtype, b_dtype));
    let rhs_err = || {
        Error::shape(format!(
            "{op}/{arity} expects the right-hand side to be a square matrix or a vector \
             matching the left-hand side, got tensor with shape: {b_shape:?}"
        ))
    };
    if b_shape.len() == a_shape.len() {
        let (b_batch, bm, bn) = matrix_batched(op, arity, b_shape)?;
        if bm != n || bn != n {
            return Err(rhs_err());
        }
        batches_match(a_batch, b_batch)?;
    } else if b_shape.len() + 1 == a_shape.len() {
        let (b_batch, last) = b_shape.split_at(b_shape.len() - 1);
        if last[0] != n {
            return Err(rhs_err());
        }
        batches_match(a_batch, b_batch)?;
    } else {
        return Err(rhs_err());
    }
    Ok(Template::new(b_shape, out_dtype))
}

fn with_matrix(batch: &[usize], rows: usize, cols: usize) -> Shape {
    batch.iter().copied().chain([rows, cols]).collect()
}
