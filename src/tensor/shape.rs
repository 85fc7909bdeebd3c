//! Shape type: dimensions of a tensor

use smallvec::SmallVec;
use std::fmt;
use std::iter::FromIterator;
use std::ops::Deref;

/// Stack allocation threshold for dimensions
/// Most tensors have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Shape type: dimensions of a tensor
///
/// The trailing two dimensions are the matrix dimensions `{rows, cols}`;
/// everything before them is the batch shape.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Shape(SmallVec<[usize; STACK_DIMS]>);

impl Shape {
    /// Create an empty (scalar) shape.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// View shape as a slice.
    pub fn as_slice(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// Number of dimensions in this shape.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (product of all dimensions).
    #[inline]
    pub fn size(&self) -> usize {
        self.0.iter().product()
    }

    /// The leading batch dimensions: everything except the trailing two.
    #[inline]
    pub fn batch_dims(&self) -> &[usize] {
        let cut = self.0.len().saturating_sub(2);
        &self.0[..cut]
    }

    /// Number of independent matrix instances in the batch.
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_dims().iter().product()
    }

    /// The trailing matrix dimensions `(rows, cols)`; `None` below rank 2.
    #[inline]
    pub fn matrix_dims(&self) -> Option<(usize, usize)> {
        let n = self.0.len();
        if n < 2 {
            None
        } else {
            Some((self.0[n - 2], self.0[n - 1]))
        }
    }

    /// A new shape with the same batch dimensions and the given matrix dims.
    pub fn with_matrix_dims(&self, rows: usize, cols: usize) -> Shape {
        self.batch_dims()
            .iter()
            .copied()
            .chain([rows, cols])
            .collect()
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self.0.as_slice()
    }
}

impl From<Vec<usize>> for Shape {
    fn from(value: Vec<usize>) -> Self {
        Self(value.into_iter().collect())
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(value: [usize; N]) -> Self {
        Self(value.into_iter().collect())
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
