//! Core type definitions for scatterax tensors.
//!
//! - Type aliases for tensor dimensions ([`Axis`], [`Rank`], [`Shape`])
//! - Element data types ([`DType`]) and the [`TensorElement`] trait tying a
//!   Rust element type to its tag
//! - A dynamically typed tensor ([`TensorValue`]) used where dtypes are only
//!   known at runtime, such as static-graph feeds
//!
//! # Examples
//!
//! ```
//! use scatterax_core::{DType, DenseND, TensorValue};
//!
//! let x = DenseND::<f32>::zeros(&[2, 3]);
//! let value = TensorValue::from(x);
//! assert_eq!(value.dtype(), DType::F32);
//! assert_eq!(value.shape(), &[2, 3]);
//! assert!(value.downcast_ref::<f32>().is_some());
//! assert!(value.downcast_ref::<f64>().is_none());
//! ```

use half::{bf16, f16};
use scirs2_core::numeric::{Float, Num, NumCast, ToPrimitive};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

pub use crate::dense::DenseND;

/// Type alias for tensor axis index (zero-indexed, already normalised).
pub type Axis = usize;

/// Type alias for tensor rank (number of dimensions).
pub type Rank = usize;

/// Shape type using SmallVec to avoid heap allocation for common cases.
///
/// Optimized for tensors with up to 6 dimensions.
pub type Shape = SmallVec<[usize; 6]>;

/// Element data type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// IEEE 754 half precision
    F16,
    /// bfloat16 (8-bit exponent, 7-bit mantissa)
    BF16,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
}

impl DType {
    /// Whether this is a floating-point type
    pub fn is_float(self) -> bool {
        matches!(self, DType::F16 | DType::BF16 | DType::F32 | DType::F64)
    }

    /// Whether this is an integer type (usable for index tensors)
    pub fn is_integer(self) -> bool {
        matches!(self, DType::I32 | DType::I64)
    }

    /// Canonical lowercase name (`"float32"`, `"int64"`, ...)
    pub fn name(self) -> &'static str {
        match self {
            DType::F16 => "float16",
            DType::BF16 => "bfloat16",
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::I32 => "int32",
            DType::I64 => "int64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "float16" | "f16" | "half" => Ok(DType::F16),
            "bfloat16" | "bf16" => Ok(DType::BF16),
            "float32" | "f32" | "float" => Ok(DType::F32),
            "float64" | "f64" | "double" => Ok(DType::F64),
            "int32" | "i32" => Ok(DType::I32),
            "int64" | "i64" => Ok(DType::I64),
            other => Err(anyhow::anyhow!("Unknown dtype '{}'", other)),
        }
    }
}

/// Rust element types that can live inside a [`TensorValue`]
pub trait TensorElement:
    Copy + Clone + Num + NumCast + ToPrimitive + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    /// Tag for this element type
    const DTYPE: DType;

    /// Wrap a typed tensor into the dynamic representation
    fn into_value(tensor: DenseND<Self>) -> TensorValue;

    /// Borrow the typed tensor if `value` holds this element type
    fn from_value(value: &TensorValue) -> Option<&DenseND<Self>>;

    /// Mutably borrow the typed tensor if `value` holds this element type
    fn from_value_mut(value: &mut TensorValue) -> Option<&mut DenseND<Self>>;

    /// Addition used when reducing scattered values; integers wrap on overflow
    fn reduce_add(self, rhs: Self) -> Self;

    /// Multiplication used when reducing scattered values; integers wrap on overflow
    fn reduce_mul(self, rhs: Self) -> Self;
}

/// Floating-point elements: valid for base and value tensors.
pub trait FloatElement: TensorElement + Float {}

impl<T: TensorElement + Float> FloatElement for T {}

/// Integer elements: valid for index tensors.
pub trait IndexElement: TensorElement + fmt::Display {}

impl IndexElement for i32 {}
impl IndexElement for i64 {}

/// Dynamically typed dense tensor
///
/// One variant per [`DType`]. Conversions to and from `DenseND<T>` go through
/// `From` and [`downcast_ref`](TensorValue::downcast_ref).
#[derive(Clone, Debug, PartialEq)]
pub enum TensorValue {
    /// Half-precision tensor
    F16(DenseND<f16>),
    /// bfloat16 tensor
    BF16(DenseND<bf16>),
    /// Single-precision tensor
    F32(DenseND<f32>),
    /// Double-precision tensor
    F64(DenseND<f64>),
    /// 32-bit integer tensor
    I32(DenseND<i32>),
    /// 64-bit integer tensor
    I64(DenseND<i64>),
}

macro_rules! reduce_arith {
    (float) => {
        fn reduce_add(self, rhs: Self) -> Self {
            self + rhs
        }

        fn reduce_mul(self, rhs: Self) -> Self {
            self * rhs
        }
    };
    (wrapping) => {
        fn reduce_add(self, rhs: Self) -> Self {
            self.wrapping_add(rhs)
        }

        fn reduce_mul(self, rhs: Self) -> Self {
            self.wrapping_mul(rhs)
        }
    };
}

macro_rules! impl_tensor_element {
    ($ty:ty, $variant:ident, $arith:ident) => {
        impl TensorElement for $ty {
            const DTYPE: DType = DType::$variant;

            fn into_value(tensor: DenseND<Self>) -> TensorValue {
                TensorValue::$variant(tensor)
            }

            fn from_value(value: &TensorValue) -> Option<&DenseND<Self>> {
                match value {
                    TensorValue::$variant(t) => Some(t),
                    _ => None,
                }
            }

            fn from_value_mut(value: &mut TensorValue) -> Option<&mut DenseND<Self>> {
                match value {
                    TensorValue::$variant(t) => Some(t),
                    _ => None,
                }
            }

            reduce_arith!($arith);
        }

        impl From<DenseND<$ty>> for TensorValue {
            fn from(tensor: DenseND<$ty>) -> Self {
                TensorValue::$variant(tensor)
            }
        }
    };
}

impl_tensor_element!(f16, F16, float);
impl_tensor_element!(bf16, BF16, float);
impl_tensor_element!(f32, F32, float);
impl_tensor_element!(f64, F64, float);
impl_tensor_element!(i32, I32, wrapping);
impl_tensor_element!(i64, I64, wrapping);

macro_rules! with_tensor {
    ($value:expr, $t:ident => $body:expr) => {
        match $value {
            TensorValue::F16($t) => $body,
            TensorValue::BF16($t) => $body,
            TensorValue::F32($t) => $body,
            TensorValue::F64($t) => $body,
            TensorValue::I32($t) => $body,
            TensorValue::I64($t) => $body,
        }
    };
}

impl TensorValue {
    /// Element type of this tensor
    pub fn dtype(&self) -> DType {
        match self {
            TensorValue::F16(_) => DType::F16,
            TensorValue::BF16(_) => DType::BF16,
            TensorValue::F32(_) => DType::F32,
            TensorValue::F64(_) => DType::F64,
            TensorValue::I32(_) => DType::I32,
            TensorValue::I64(_) => DType::I64,
        }
    }

    /// Shape of this tensor
    pub fn shape(&self) -> &[usize] {
        with_tensor!(self, t => t.shape())
    }

    /// Rank of this tensor
    pub fn rank(&self) -> Rank {
        self.shape().len()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        with_tensor!(self, t => t.len())
    }

    /// Whether the tensor has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow as a typed tensor
    pub fn downcast_ref<T: TensorElement>(&self) -> Option<&DenseND<T>> {
        T::from_value(self)
    }

    /// Mutably borrow as a typed tensor
    pub fn downcast_mut<T: TensorElement>(&mut self) -> Option<&mut DenseND<T>> {
        T::from_value_mut(self)
    }

    /// Elements converted to `f64` in row-major order
    ///
    /// Used for dtype-independent comparisons against reference results.
    ///
    /// ```
    /// use scatterax_core::{DenseND, TensorValue};
    ///
    /// let v = TensorValue::from(DenseND::from_vec(vec![1_i32, 2], &[2]).unwrap());
    /// assert_eq!(v.to_f64_vec(), vec![1.0, 2.0]);
    /// ```
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_tensor!(self, t => t.iter().map(|v| ToPrimitive::to_f64(v).unwrap_or(f64::NAN)).collect())
    }

    /// Convert to another element type
    pub fn cast(&self, dtype: DType) -> anyhow::Result<TensorValue> {
        fn cast_to<U: TensorElement>(value: &TensorValue) -> anyhow::Result<TensorValue> {
            let converted: DenseND<U> = with_tensor!(value, t => t.cast::<U>()?);
            Ok(U::into_value(converted))
        }
        match dtype {
            DType::F16 => cast_to::<f16>(self),
            DType::BF16 => cast_to::<bf16>(self),
            DType::F32 => cast_to::<f32>(self),
            DType::F64 => cast_to::<f64>(self),
            DType::I32 => cast_to::<i32>(self),
            DType::I64 => cast_to::<i64>(self),
        }
    }
}
