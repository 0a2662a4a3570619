//! Eager execution on dynamically typed tensors
//!
//! These functions take [`TensorValue`]s, dispatch on their dtypes and call
//! the typed kernels directly. The static-graph [`Executor`](crate::Executor)
//! uses the same entry points for every op it runs.

use crate::error::ExecError;
use anyhow::Result;
use scatterax_ad::vjp::put_along_axis_grad as typed_grad;
use scatterax_core::{bf16, f16, DType, DenseND, FloatElement, TensorElement, TensorValue};
use scatterax_kernels::{
    put_along_axis as typed_put, put_along_axis_ as typed_put_, KernelError,
    PutAlongAxisOptions, PutValues,
};

const OPERATION: &str = "put_along_axis";

/// Values argument for eager calls
#[derive(Debug, Clone, Copy)]
pub enum ValueArg<'a> {
    /// Tensor with the same dtype as the base
    Tensor(&'a TensorValue),
    /// Host scalar, cast to the base dtype
    Scalar(f64),
}

impl<'a> From<&'a TensorValue> for ValueArg<'a> {
    fn from(value: &'a TensorValue) -> Self {
        ValueArg::Tensor(value)
    }
}

impl From<f64> for ValueArg<'_> {
    fn from(value: f64) -> Self {
        ValueArg::Scalar(value)
    }
}

/// Gradients returned by [`put_along_axis_grad`]
#[derive(Debug, Clone, PartialEq)]
pub struct EagerGrads {
    /// Gradient of the base tensor
    pub input: TensorValue,
    /// Gradient of the values, `None` for a host scalar
    pub values: Option<TensorValue>,
}

macro_rules! dispatch_all {
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

/// Resolve a [`ValueArg`] against the base element type
fn typed_values<T: TensorElement>(values: ValueArg<'_>) -> Result<PutValues<'_, T>> {
    match values {
        ValueArg::Tensor(v) => {
            let tensor = v.downcast_ref::<T>().ok_or(KernelError::DTypeMismatch {
                operation: OPERATION.to_string(),
                operand: "values",
                expected: T::DTYPE,
                actual: v.dtype(),
            })?;
            Ok(PutValues::Tensor(tensor))
        }
        ValueArg::Scalar(s) => {
            let scalar = <T as scirs2_core::numeric::NumCast>::from(s).ok_or(
                KernelError::UnrepresentableScalar {
                    operation: OPERATION.to_string(),
                    value: s,
                    dtype: T::DTYPE,
                },
            )?;
            Ok(PutValues::Scalar(scalar))
        }
    }
}

fn non_integer_index(dtype: DType) -> anyhow::Error {
    KernelError::NonIntegerIndex {
        operation: OPERATION.to_string(),
        dtype,
    }
    .into()
}

fn scatter<T: TensorElement>(
    x: &DenseND<T>,
    index: &TensorValue,
    values: ValueArg<'_>,
    axis: isize,
    opts: &PutAlongAxisOptions,
) -> Result<DenseND<T>> {
    let values = typed_values::<T>(values)?;
    match index {
        TensorValue::I32(i) => Ok(typed_put(x, i, values, axis, opts)?),
        TensorValue::I64(i) => Ok(typed_put(x, i, values, axis, opts)?),
        other => Err(non_integer_index(other.dtype())),
    }
}

fn scatter_in_place<T: TensorElement>(
    x: &mut DenseND<T>,
    index: &TensorValue,
    values: ValueArg<'_>,
    axis: isize,
    opts: &PutAlongAxisOptions,
) -> Result<()> {
    let values = typed_values::<T>(values)?;
    match index {
        TensorValue::I32(i) => Ok(typed_put_(x, i, values, axis, opts)?),
        TensorValue::I64(i) => Ok(typed_put_(x, i, values, axis, opts)?),
        other => Err(non_integer_index(other.dtype())),
    }
}

fn gradients<T: FloatElement>(
    x: &DenseND<T>,
    index: &TensorValue,
    values: ValueArg<'_>,
    axis: isize,
    opts: &PutAlongAxisOptions,
    output_grad: Option<&TensorValue>,
) -> Result<EagerGrads> {
    let values = typed_values::<T>(values)?;
    let ones;
    let output_grad = match output_grad {
        Some(g) => g.downcast_ref::<T>().ok_or(KernelError::DTypeMismatch {
            operation: OPERATION.to_string(),
            operand: "output_grad",
            expected: T::DTYPE,
            actual: g.dtype(),
        })?,
        None => {
            ones = DenseND::<T>::ones(x.shape());
            &ones
        }
    };
    let grads = match index {
        TensorValue::I32(i) => typed_grad(x, i, values, axis, opts, output_grad)?,
        TensorValue::I64(i) => typed_grad(x, i, values, axis, opts, output_grad)?,
        other => return Err(non_integer_index(other.dtype())),
    };
    Ok(EagerGrads {
        input: T::into_value(grads.input),
        values: grads.values.map(T::into_value),
    })
}

/// Scatter `values` into a copy of `x` along `axis`
///
/// # Example
///
/// ```
/// use scatterax_core::{DenseND, TensorValue};
/// use scatterax_exec::eager::{put_along_axis, ValueArg};
/// use scatterax_kernels::PutAlongAxisOptions;
///
/// let x = TensorValue::from(DenseND::<f32>::zeros(&[2, 2]));
/// let index = TensorValue::from(DenseND::from_vec(vec![0_i64, 1], &[1, 2]).unwrap());
/// let out = put_along_axis(&x, &index, ValueArg::Scalar(99.0), 0, &PutAlongAxisOptions::default())
///     .unwrap();
/// assert_eq!(out.to_f64_vec(), vec![99.0, 0.0, 0.0, 99.0]);
/// ```
pub fn put_along_axis(
    x: &TensorValue,
    index: &TensorValue,
    values: ValueArg<'_>,
    axis: isize,
    opts: &PutAlongAxisOptions,
) -> Result<TensorValue> {
    let out = dispatch_all!(x, t => TensorValue::from(scatter(t, index, values, axis, opts)?));
    tracing::debug!(dtype = %x.dtype(), shape = ?x.shape(), axis, "eager put_along_axis");
    Ok(out)
}

/// Scatter `values` into `x` itself; `x` is unchanged on error
pub fn put_along_axis_(
    x: &mut TensorValue,
    index: &TensorValue,
    values: ValueArg<'_>,
    axis: isize,
    opts: &PutAlongAxisOptions,
) -> Result<()> {
    let dtype = x.dtype();
    dispatch_all!(x, t => scatter_in_place(t, index, values, axis, opts)?);
    tracing::debug!(dtype = %dtype, axis, "eager put_along_axis_ (in place)");
    Ok(())
}

/// Gradients of `put_along_axis` with respect to `x` and the values
///
/// `output_grad` defaults to ones, which gives the gradients of
/// `sum(put_along_axis(..))`.
pub fn put_along_axis_grad(
    x: &TensorValue,
    index: &TensorValue,
    values: ValueArg<'_>,
    axis: isize,
    opts: &PutAlongAxisOptions,
    output_grad: Option<&TensorValue>,
) -> Result<EagerGrads> {
    match x {
        TensorValue::F16(t) => gradients::<f16>(t, index, values, axis, opts, output_grad),
        TensorValue::BF16(t) => gradients::<bf16>(t, index, values, axis, opts, output_grad),
        TensorValue::F32(t) => gradients::<f32>(t, index, values, axis, opts, output_grad),
        TensorValue::F64(t) => gradients::<f64>(t, index, values, axis, opts, output_grad),
        other => Err(ExecError::NonFloatGradient(other.dtype()).into()),
    }
}
