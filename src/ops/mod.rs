//! Tensor operations shared by the linear algebra layer

mod matmul;

pub use matmul::matmul;
