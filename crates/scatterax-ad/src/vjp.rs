//! Vector-Jacobian Product (VJP) rules for put_along_axis
//!
//! For `y = put_along_axis(x, index, v, axis)` and an incoming cotangent
//! `dy = ∂L/∂y` (shape of `x`), the VJP computes `∂L/∂x` and `∂L/∂v`.
//!
//! # Rules
//!
//! Let `t(p)` be the target written by index position `p`.
//!
//! - **assign**: `dx = dy` with every touched target zeroed; `dv[p] = dy[t(p)]`
//!   when `p` is the last writer of `t(p)`, otherwise 0.
//! - **add**: `dx = dy` (touched targets zeroed when `include_self` is false);
//!   `dv[p] = dy[t(p)]`.
//! - **mul**: for a target written by `v_1..v_k`, with `s = x[t]` when
//!   `include_self` else 1: `dx[t] = dy[t] * prod(v)` (0 without
//!   `include_self`) and `dv_j = dy[t] * s * prod_{i != j} v_i`. The
//!   leave-one-out products use prefix and suffix products, so zeros among
//!   the `v_i` are handled exactly.
//!
//! `dv` is then mapped back to the caller's value shape: summed over
//! broadcast dimensions, or scattered into a zero tensor when values were
//! read as a window. A host scalar value gets no gradient.

use anyhow::{anyhow, Result};
use scatterax_core::dense::{ravel_index, row_major_strides, unravel_index};
use scatterax_core::{DenseND, IndexElement, TensorElement};
use scatterax_kernels::{
    prepare_put_along_axis, PutAlongAxisOptions, PutAlongAxisPlan, PutValues, Reduce, ValueSource,
};
use scirs2_core::numeric::Num;

/// Trait for operations that support VJP (backward differentiation)
pub trait VjpOp<T>
where
    T: Num + Clone,
{
    /// Compute the VJP (backward pass) given the output gradient
    ///
    /// # Returns
    ///
    /// Gradients w.r.t. each differentiable input, in input order
    fn vjp(&self, output_grad: &DenseND<T>) -> Result<Vec<DenseND<T>>>;
}

/// Gradients of put_along_axis
#[derive(Debug, Clone)]
pub struct PutAlongAxisGrads<T> {
    /// ∂L/∂x, shape of the input
    pub input: DenseND<T>,
    /// ∂L/∂v, shape of the values; `None` for a host scalar
    pub values: Option<DenseND<T>>,
}

/// VJP context for put_along_axis
///
/// Holds the resolved scatter plan and, for `mul`, the original input.
///
/// # Example
///
/// ```
/// use scatterax_ad::vjp::PutAlongAxisVjp;
/// use scatterax_core::DenseND;
/// use scatterax_kernels::{PutAlongAxisOptions, PutValues, Reduce};
///
/// let x = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let index = DenseND::from_vec(vec![0_i64, 0], &[2]).unwrap();
/// let v = DenseND::from_vec(vec![4.0, 5.0], &[2]).unwrap();
/// let opts = PutAlongAxisOptions::new().with_reduce(Reduce::Add);
///
/// let (y, ctx) = PutAlongAxisVjp::forward(&x, &index, PutValues::Tensor(&v), 0, &opts).unwrap();
/// assert_eq!(y.to_vec(), vec![10.0, 2.0, 3.0]);
///
/// let grads = ctx.backward(&DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap()).unwrap();
/// assert_eq!(grads.input.to_vec(), vec![1.0, 2.0, 3.0]);
/// assert_eq!(grads.values.unwrap().to_vec(), vec![1.0, 1.0]);
/// ```
#[derive(Debug, Clone)]
pub struct PutAlongAxisVjp<T> {
    plan: PutAlongAxisPlan<T>,
    input: Option<DenseND<T>>,
}

impl<T> PutAlongAxisVjp<T>
where
    T: TensorElement,
{
    /// Wrap an already prepared plan
    ///
    /// `input` is required when the plan reduces with `mul`.
    pub fn new(plan: PutAlongAxisPlan<T>, input: Option<DenseND<T>>) -> Result<Self> {
        if plan.reduce == Reduce::Mul && input.is_none() {
            return Err(anyhow!("mul backward needs the forward input"));
        }
        Ok(Self { plan, input })
    }

    /// Run the forward scatter and keep what the backward pass needs
    pub fn forward<I: IndexElement>(
        input: &DenseND<T>,
        index: &DenseND<I>,
        values: PutValues<'_, T>,
        axis: isize,
        opts: &PutAlongAxisOptions,
    ) -> Result<(DenseND<T>, Self)> {
        let plan = prepare_put_along_axis(input.shape(), index, values, axis, opts)?;
        let mut output = input.clone();
        plan.apply_to(&mut output);
        let saved = (plan.reduce == Reduce::Mul).then(|| input.clone());
        Ok((output, Self { plan, input: saved }))
    }

    /// The scatter plan
    pub fn plan(&self) -> &PutAlongAxisPlan<T> {
        &self.plan
    }

    /// Compute gradients for input and values
    pub fn backward(&self, output_grad: &DenseND<T>) -> Result<PutAlongAxisGrads<T>> {
        let plan = &self.plan;
        if output_grad.shape() != plan.input_shape.as_slice() {
            return Err(anyhow!(
                "Output gradient shape {:?} doesn't match input shape {:?}",
                output_grad.shape(),
                plan.input_shape
            ));
        }

        let g = output_grad.to_vec();
        let mut dx = g.clone();
        let mut dv = vec![T::zero(); plan.len()];

        match plan.reduce {
            Reduce::Assign => {
                for &t in &plan.targets {
                    dx[t] = T::zero();
                }
                for (k, last) in plan.last_writers().into_iter().enumerate() {
                    if last {
                        dv[k] = g[plan.targets[k]];
                    }
                }
            }
            Reduce::Add => {
                if !plan.include_self {
                    for &t in &plan.targets {
                        dx[t] = T::zero();
                    }
                }
                for (k, &t) in plan.targets.iter().enumerate() {
                    dv[k] = g[t];
                }
            }
            Reduce::Mul => {
                let input = self
                    .input
                    .as_ref()
                    .ok_or_else(|| anyhow!("mul backward needs the forward input"))?
                    .to_vec();
                self.mul_backward(&g, &input, &mut dx, &mut dv);
            }
        }

        let input_grad = DenseND::from_vec(dx, &plan.input_shape)?;
        let values_grad = self.values_grad(dv)?;

        tracing::debug!(
            reduce = %plan.reduce,
            writes = plan.len(),
            values_grad = values_grad.is_some(),
            "put_along_axis backward"
        );

        Ok(PutAlongAxisGrads {
            input: input_grad,
            values: values_grad,
        })
    }

    fn mul_backward(&self, g: &[T], input: &[T], dx: &mut [T], dv: &mut [T]) {
        let plan = &self.plan;
        let mut order: Vec<usize> = (0..plan.len()).collect();
        order.sort_by_key(|&k| plan.targets[k]);

        for group in order.chunk_by(|&a, &b| plan.targets[a] == plan.targets[b]) {
            let t = plan.targets[group[0]];
            let base = if plan.include_self {
                input[t]
            } else {
                T::one()
            };

            // prefix[i] = v_0 * .. * v_{i-1}
            let mut prefix = Vec::with_capacity(group.len() + 1);
            prefix.push(T::one());
            for &k in group {
                let last = prefix[prefix.len() - 1];
                prefix.push(last * plan.values[k]);
            }
            let mut suffix = T::one();
            for (i, &k) in group.iter().enumerate().rev() {
                dv[k] = g[t] * base * prefix[i] * suffix;
                suffix = suffix * plan.values[k];
            }

            dx[t] = if plan.include_self {
                g[t] * prefix[group.len()]
            } else {
                T::zero()
            };
        }
    }

    fn values_grad(&self, dv: Vec<T>) -> Result<Option<DenseND<T>>> {
        let plan = &self.plan;
        match &plan.value_source {
            ValueSource::Scalar => Ok(None),
            ValueSource::Broadcast { shape } => {
                let full = DenseND::from_vec(dv, &plan.index_shape)?;
                Ok(Some(full.sum_to_shape(shape)?))
            }
            ValueSource::Window { shape } => {
                let mut out = vec![T::zero(); shape.iter().product()];
                let strides = row_major_strides(shape);
                let mut coord = vec![0; plan.index_shape.len()];
                for (p, g) in dv.into_iter().enumerate() {
                    unravel_index(p, &plan.index_shape, &mut coord);
                    out[ravel_index(&coord, &strides)] = g;
                }
                Ok(Some(DenseND::from_vec(out, shape)?))
            }
        }
    }
}

impl<T> VjpOp<T> for PutAlongAxisVjp<T>
where
    T: TensorElement,
{
    /// Returns `[dx]`, or `[dx, dv]` when values are a tensor
    fn vjp(&self, output_grad: &DenseND<T>) -> Result<Vec<DenseND<T>>> {
        let grads = self.backward(output_grad)?;
        let mut out = vec![grads.input];
        out.extend(grads.values);
        Ok(out)
    }
}

/// Gradients of `put_along_axis` for a given cotangent
///
/// Convenience wrapper around [`PutAlongAxisVjp::forward`] followed by
/// [`PutAlongAxisVjp::backward`].
pub fn put_along_axis_grad<T, I>(
    input: &DenseND<T>,
    index: &DenseND<I>,
    values: PutValues<'_, T>,
    axis: isize,
    opts: &PutAlongAxisOptions,
    output_grad: &DenseND<T>,
) -> Result<PutAlongAxisGrads<T>>
where
    T: TensorElement,
    I: IndexElement,
{
    let (_, ctx) = PutAlongAxisVjp::forward(input, index, values, axis, opts)?;
    ctx.backward(output_grad)
}
