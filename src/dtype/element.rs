//! Element traits bridging runtime dtypes and typed kernels

use super::DType;
use crate::tensor::Storage;
use num_complex::Complex;
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Element types that can back a tensor
///
/// Ties a Rust type to its runtime [`DType`] tag and to the matching
/// [`Storage`] variant, so operations can move between untyped dispatch and
/// typed slices.
pub trait Element: Copy + Send + Sync + Debug + 'static {
    /// The runtime dtype tag for this element type
    const DTYPE: DType;

    /// Move a typed vector into storage
    fn into_storage(data: Vec<Self>) -> Storage;

    /// View storage as a slice of this type; `None` if the dtype differs
    fn from_storage(storage: &Storage) -> Option<&[Self]>;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$variant;

            #[inline]
            fn into_storage(data: Vec<Self>) -> Storage {
                Storage::$variant(data)
            }

            #[inline]
            fn from_storage(storage: &Storage) -> Option<&[Self]> {
                match storage {
                    Storage::$variant(data) => Some(data),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(f32, F32);
impl_element!(f64, F64);
impl_element!(Complex<f32>, C64);
impl_element!(Complex<f64>, C128);

/// Elements that support linear algebra kernels
///
/// Extends [`Element`] with the arithmetic the numeric kernels need. The
/// magnitude-like accessors (`abs`, `re`, `epsilon`) go through `f64` so
/// pivot selection, convergence checks, and rotation angles are computed in
/// full precision regardless of the storage type. `conj` is the identity for
/// real elements, which lets one generic kernel serve both real and complex
/// factorizations.
pub trait LinalgScalar:
    Element
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Additive identity
    fn zero() -> Self;

    /// Multiplicative identity
    fn one() -> Self;

    /// Embed a real value (imaginary part zero for complex types)
    fn from_f64(value: f64) -> Self;

    /// Magnitude as f64 (absolute value, or modulus for complex)
    fn abs(&self) -> f64;

    /// Real part as f64
    fn re(&self) -> f64;

    /// Complex conjugate (identity for real types)
    fn conj(&self) -> Self;

    /// Principal square root
    fn sqrt(&self) -> Self;

    /// Machine epsilon of the underlying real type
    fn epsilon() -> f64;
}

impl LinalgScalar for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }
    #[inline]
    fn one() -> Self {
        1.0
    }
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
    #[inline]
    fn abs(&self) -> f64 {
        f32::abs(*self) as f64
    }
    #[inline]
    fn re(&self) -> f64 {
        *self as f64
    }
    #[inline]
    fn conj(&self) -> Self {
        *self
    }
    #[inline]
    fn sqrt(&self) -> Self {
        f32::sqrt(*self)
    }
    #[inline]
    fn epsilon() -> f64 {
        f32::EPSILON as f64
    }
}

impl LinalgScalar for f64 {
    #[inline]
    fn zero() -> Self {
        0.0
    }
    #[inline]
    fn one() -> Self {
        1.0
    }
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
    #[inline]
    fn abs(&self) -> f64 {
        f64::abs(*self)
    }
    #[inline]
    fn re(&self) -> f64 {
        *self
    }
    #[inline]
    fn conj(&self) -> Self {
        *self
    }
    #[inline]
    fn sqrt(&self) -> Self {
        f64::sqrt(*self)
    }
    #[inline]
    fn epsilon() -> f64 {
        f64::EPSILON
    }
}

impl LinalgScalar for Complex<f32> {
    #[inline]
    fn zero() -> Self {
        Complex::new(0.0, 0.0)
    }
    #[inline]
    fn one() -> Self {
        Complex::new(1.0, 0.0)
    }
    #[inline]
    fn from_f64(value: f64) -> Self {
        Complex::new(value as f32, 0.0)
    }
    #[inline]
    fn abs(&self) -> f64 {
        self.norm() as f64
    }
    #[inline]
    fn re(&self) -> f64 {
        self.re as f64
    }
    #[inline]
    fn conj(&self) -> Self {
        Complex::new(self.re, -self.im)
    }
    #[inline]
    fn sqrt(&self) -> Self {
        Complex::sqrt(*self)
    }
    #[inline]
    fn epsilon() -> f64 {
        f32::EPSILON as f64
    }
}

impl LinalgScalar for Complex<f64> {
    #[inline]
    fn zero() -> Self {
        Complex::new(0.0, 0.0)
    }
    #[inline]
    fn one() -> Self {
        Complex::new(1.0, 0.0)
    }
    #[inline]
    fn from_f64(value: f64) -> Self {
        Complex::new(value, 0.0)
    }
    #[inline]
    fn abs(&self) -> f64 {
        self.norm()
    }
    #[inline]
    fn re(&self) -> f64 {
        self.re
    }
    #[inline]
    fn conj(&self) -> Self {
        Complex::new(self.re, -self.im)
    }
    #[inline]
    fn sqrt(&self) -> Self {
        Complex::sqrt(*self)
    }
    #[inline]
    fn epsilon() -> f64 {
        f64::EPSILON
    }
}
