//! Error types for linr
//!
//! The taxonomy separates what can be detected where: [`Error::Shape`] comes
//! out of the resolver before any numeric work, [`Error::SingularMatrix`]
//! only out of the numeric layer (it depends on data, not shape), and the
//! option/implementation errors out of argument validation.

use thiserror::Error;

/// Result type alias using linr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in linr operations
#[derive(Error, Debug)]
pub enum Error {
    /// Rank, dimension, squareness, or batch-compatibility violation,
    /// detected entirely by the shape resolver before numeric work
    #[error("{message}")]
    Shape {
        /// Description of the violated shape requirement
        message: String,
    },

    /// A divide-by-near-zero pivot or diagonal encountered during a solve
    #[error("can't solve for singular matrix")]
    SingularMatrix,

    /// An enumerated option given a value outside its declared set
    #[error("unsupported option {option}: got {value}")]
    UnsupportedOption {
        /// The option name
        option: &'static str,
        /// The rejected value
        value: String,
    },

    /// A documented but unimplemented combination
    #[error("not implemented: {feature}")]
    NotImplemented {
        /// Description of the unimplemented combination
        feature: String,
    },

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a shape error from a message
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }

    /// Shape error for an operation that requires square matrices
    pub fn square_expected(op: &'static str, arity: usize, shape: &[usize]) -> Self {
        Self::Shape {
            message: format!(
                "{op}/{arity} expects a square matrix or a batch of square matrices, \
                 got tensor with shape: {shape:?}"
            ),
        }
    }

    /// Shape error for an operation that requires at least matrix rank
    pub fn matrix_expected(op: &'static str, arity: usize, shape: &[usize]) -> Self {
        Self::Shape {
            message: format!(
                "{op}/{arity} expects a matrix or a batch of matrices, \
                 got tensor with shape: {shape:?}"
            ),
        }
    }

    /// Shape error raised when a Hermitian/symmetric matrix is required
    pub fn hermitian_expected() -> Self {
        Self::Shape {
            message: "matrix must be hermitian, a matrix is hermitian iff X = adjoint(X)"
                .to_string(),
        }
    }

    /// Shape error for operations restricted to vectors and matrices
    pub fn vector_or_matrix_expected(shape: &[usize]) -> Self {
        Self::Shape {
            message: format!("expected 1-D or 2-D tensor, got tensor with shape {shape:?}"),
        }
    }

    /// Create an unsupported-option error
    pub fn unsupported_option(option: &'static str, value: impl Into<String>) -> Self {
        Self::UnsupportedOption {
            option,
            value: value.into(),
        }
    }

    /// Create a not-implemented error
    pub fn not_implemented(feature: impl Into<String>) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
        }
    }
}
