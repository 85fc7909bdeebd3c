//! Core Tensor type

use super::{Shape, Storage};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use num_complex::Complex;
use num_traits::{One, Zero};
use std::fmt;
use std::sync::Arc;

/// N-dimensional array with batched-matrix semantics
///
/// `Tensor` is immutable: every operation produces a new tensor, and views
/// that preserve the element layout (reshape) share storage behind an `Arc`.
/// The element type is tracked at runtime via [`DType`] so operations can
/// promote mixed inputs before dispatching to typed kernels.
#[derive(Clone)]
pub struct Tensor {
    shape: Shape,
    storage: Arc<Storage>,
}

/// Apply a storage-generic function to whichever variant is present,
/// rebuilding the same variant from the result.
macro_rules! map_storage {
    ($storage:expr, $f:ident $(, $arg:expr)*) => {
        match $storage {
            Storage::I32(d) => Storage::I32($f(d $(, $arg)*)),
            Storage::I64(d) => Storage::I64($f(d $(, $arg)*)),
            Storage::F32(d) => Storage::F32($f(d $(, $arg)*)),
            Storage::F64(d) => Storage::F64($f(d $(, $arg)*)),
            Storage::C64(d) => Storage::C64($f(d $(, $arg)*)),
            Storage::C128(d) => Storage::C128($f(d $(, $arg)*)),
        }
    };
}

impl Tensor {
    /// Create a tensor from a slice of data
    ///
    /// Returns a shape error if `data.len()` does not equal the product of
    /// the `shape` dimensions. An empty `shape` denotes a scalar.
    pub fn from_slice<T: Element>(data: &[T], shape: impl AsRef<[usize]>) -> Result<Self> {
        let shape = shape.as_ref();
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::shape(format!(
                "cannot build tensor with shape {:?} from {} elements",
                shape,
                data.len()
            )));
        }
        Ok(Self {
            shape: Shape::from(shape),
            storage: Arc::new(T::into_storage(data.to_vec())),
        })
    }

    /// Create a tensor from an owned vector without copying
    pub fn from_vec<T: Element>(data: Vec<T>, shape: impl AsRef<[usize]>) -> Result<Self> {
        let shape = shape.as_ref();
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::shape(format!(
                "cannot build tensor with shape {:?} from {} elements",
                shape,
                data.len()
            )));
        }
        Ok(Self {
            shape: Shape::from(shape),
            storage: Arc::new(T::into_storage(data)),
        })
    }

    /// Create a tensor filled with zeros
    pub fn zeros(shape: impl AsRef<[usize]>, dtype: DType) -> Self {
        let shape = shape.as_ref();
        let len: usize = shape.iter().product();
        let storage = match dtype {
            DType::I32 => Storage::I32(vec![0; len]),
            DType::I64 => Storage::I64(vec![0; len]),
            DType::F32 => Storage::F32(vec![0.0; len]),
            DType::F64 => Storage::F64(vec![0.0; len]),
            DType::C64 => Storage::C64(vec![Complex::zero(); len]),
            DType::C128 => Storage::C128(vec![Complex::zero(); len]),
        };
        Self {
            shape: Shape::from(shape),
            storage: Arc::new(storage),
        }
    }

    /// Create a batch of identity matrices with shape `batch_dims × n × n`
    pub fn identity(batch_dims: &[usize], n: usize, dtype: DType) -> Self {
        let batch: usize = batch_dims.iter().product();
        let storage = match dtype {
            DType::I32 => Storage::I32(eye_vec(batch, n)),
            DType::I64 => Storage::I64(eye_vec(batch, n)),
            DType::F32 => Storage::F32(eye_vec(batch, n)),
            DType::F64 => Storage::F64(eye_vec(batch, n)),
            DType::C64 => Storage::C64(eye_vec(batch, n)),
            DType::C128 => Storage::C128(eye_vec(batch, n)),
        };
        let shape: Shape = batch_dims.iter().copied().chain([n, n]).collect();
        Self {
            shape,
            storage: Arc::new(storage),
        }
    }

    // ===== Accessors =====

    /// Dimensions as a slice
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.shape.as_slice()
    }

    /// The shape object, with batch/matrix accessors
    #[inline]
    pub fn dims(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Total number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the tensor holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// View the backing data as a typed slice
    ///
    /// The requested type must match the tensor's dtype; callers dispatch on
    /// [`Self::dtype`] first, so a mismatch is an internal invariant failure.
    pub fn data<T: Element>(&self) -> Result<&[T]> {
        T::from_storage(&self.storage).ok_or_else(|| {
            Error::Internal(format!(
                "requested {} data from a {} tensor",
                T::DTYPE,
                self.dtype()
            ))
        })
    }

    /// Copy the backing data out as a typed vector
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.data::<T>().map(|slice| slice.to_vec())
    }

    /// Magnitudes of all elements as f64, in storage order
    pub fn abs_values(&self) -> Vec<f64> {
        match &*self.storage {
            Storage::I32(d) => d.iter().map(|v| (*v as f64).abs()).collect(),
            Storage::I64(d) => d.iter().map(|v| (*v as f64).abs()).collect(),
            Storage::F32(d) => d.iter().map(|v| (*v as f64).abs()).collect(),
            Storage::F64(d) => d.iter().map(|v| v.abs()).collect(),
            Storage::C64(d) => d.iter().map(|v| v.norm() as f64).collect(),
            Storage::C128(d) => d.iter().map(|v| v.norm()).collect(),
        }
    }

    // ===== Conversions =====

    /// Convert to another dtype, copying the data
    ///
    /// Real and integer tensors can be cast to any dtype; complex tensors
    /// only to complex dtypes (dropping the imaginary part is never implied
    /// by promotion, so it is an internal error here).
    pub fn cast(&self, dtype: DType) -> Result<Tensor> {
        if self.dtype() == dtype {
            return Ok(self.clone());
        }
        let storage = match dtype {
            DType::I32 => Storage::I32(self.real_values()?.iter().map(|v| *v as i32).collect()),
            DType::I64 => Storage::I64(self.real_values()?.iter().map(|v| *v as i64).collect()),
            DType::F32 => Storage::F32(self.real_values()?.iter().map(|v| *v as f32).collect()),
            DType::F64 => Storage::F64(self.real_values()?),
            DType::C64 => Storage::C64(
                self.complex_values()
                    .iter()
                    .map(|z| Complex::new(z.re as f32, z.im as f32))
                    .collect(),
            ),
            DType::C128 => Storage::C128(self.complex_values()),
        };
        Ok(Self {
            shape: self.shape.clone(),
            storage: Arc::new(storage),
        })
    }

    fn real_values(&self) -> Result<Vec<f64>> {
        match &*self.storage {
            Storage::I32(d) => Ok(d.iter().map(|v| *v as f64).collect()),
            Storage::I64(d) => Ok(d.iter().map(|v| *v as f64).collect()),
            Storage::F32(d) => Ok(d.iter().map(|v| *v as f64).collect()),
            Storage::F64(d) => Ok(d.clone()),
            Storage::C64(_) | Storage::C128(_) => Err(Error::Internal(
                "cannot cast a complex tensor to a real dtype".to_string(),
            )),
        }
    }

    fn complex_values(&self) -> Vec<Complex<f64>> {
        match &*self.storage {
            Storage::I32(d) => d.iter().map(|v| Complex::new(*v as f64, 0.0)).collect(),
            Storage::I64(d) => d.iter().map(|v| Complex::new(*v as f64, 0.0)).collect(),
            Storage::F32(d) => d.iter().map(|v| Complex::new(*v as f64, 0.0)).collect(),
            Storage::F64(d) => d.iter().map(|v| Complex::new(*v, 0.0)).collect(),
            Storage::C64(d) => d
                .iter()
                .map(|z| Complex::new(z.re as f64, z.im as f64))
                .collect(),
            Storage::C128(d) => d.clone(),
        }
    }

    // ===== Structural operations =====

    /// Reinterpret the tensor with a new shape of the same total size
    ///
    /// Shares storage with the source tensor.
    pub fn reshape(&self, shape: impl AsRef<[usize]>) -> Result<Tensor> {
        let shape = shape.as_ref();
        let expected: usize = shape.iter().product();
        if expected != self.len() {
            return Err(Error::shape(format!(
                "cannot reshape tensor with shape {:?} into {:?}",
                self.shape(),
                shape
            )));
        }
        Ok(Self {
            shape: Shape::from(shape),
            storage: Arc::clone(&self.storage),
        })
    }

    /// Swap the trailing two axes of every batch entry
    pub fn transpose(&self) -> Result<Tensor> {
        let (m, n) = self.dims().matrix_dims().ok_or_else(|| {
            Error::shape(format!(
                "transpose expects a matrix or a batch of matrices, got tensor with shape: {:?}",
                self.shape()
            ))
        })?;
        let batch = self.dims().batch_size();
        let storage = map_storage!(&*self.storage, transpose_copy, batch, m, n);
        Ok(Self {
            shape: self.shape.with_matrix_dims(n, m),
            storage: Arc::new(storage),
        })
    }

    /// Conjugate transpose over the trailing two axes
    pub fn adjoint(&self) -> Result<Tensor> {
        Ok(self.transpose()?.conj())
    }

    /// Elementwise complex conjugate (identity for real tensors)
    pub fn conj(&self) -> Tensor {
        let storage = match &*self.storage {
            Storage::C64(d) => Storage::C64(d.iter().map(|z| z.conj()).collect()),
            Storage::C128(d) => Storage::C128(d.iter().map(|z| z.conj()).collect()),
            _ => return self.clone(),
        };
        Self {
            shape: self.shape.clone(),
            storage: Arc::new(storage),
        }
    }

    /// Elementwise negation
    pub fn neg(&self) -> Tensor {
        let storage = map_storage!(&*self.storage, neg_copy);
        Self {
            shape: self.shape.clone(),
            storage: Arc::new(storage),
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("dtype", &self.dtype())
            .finish()
    }
}

fn eye_vec<T: Copy + Zero + One>(batch: usize, n: usize) -> Vec<T> {
    let mut data = vec![T::zero(); batch * n * n];
    for b in 0..batch {
        for i in 0..n {
            data[b * n * n + i * n + i] = T::one();
        }
    }
    data
}

fn transpose_copy<T: Copy>(data: &[T], batch: usize, m: usize, n: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(data.len());
    for b in 0..batch {
        let base = b * m * n;
        for j in 0..n {
            for i in 0..m {
                out.push(data[base + i * n + j]);
            }
        }
    }
    out
}

fn neg_copy<T: Copy + std::ops::Neg<Output = T>>(data: &[T]) -> Vec<T> {
    data.iter().map(|v| -*v).collect()
}
