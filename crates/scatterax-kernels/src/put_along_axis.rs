//! Scatter values into a tensor along one axis
//!
//! `put_along_axis(x, index, values, axis)` writes `values[p]` to the
//! position of `x` obtained from `p` by replacing its `axis` coordinate with
//! `index[p]`, for every position `p` of `index` in row-major order.
//!
//! The work is split in two phases:
//!
//! 1. [`prepare_put_along_axis`] validates every argument, broadcasts index
//!    and values, and resolves each write to a flat offset into `x`. Nothing
//!    is written during this phase, so an error leaves `x` untouched.
//! 2. [`PutAlongAxisPlan::apply`] performs the writes in order.
//!
//! The plan is also what the backward pass consumes.
//!
//! # Examples
//!
//! ```
//! use scatterax_core::DenseND;
//! use scatterax_kernels::{put_along_axis, PutAlongAxisOptions, PutValues};
//!
//! let x = DenseND::from_vec(vec![10.0, 30.0, 40.0, 60.0], &[2, 2]).unwrap();
//! let index = DenseND::from_vec(vec![0_i64, 0, 1, 0], &[2, 2]).unwrap();
//!
//! let out = put_along_axis(&x, &index, PutValues::Scalar(99.0), 0, &PutAlongAxisOptions::default())
//!     .unwrap();
//! assert_eq!(out.to_vec(), vec![99.0, 99.0, 99.0, 60.0]);
//! ```

use crate::error::{invalid_axis, size_mismatch, KernelError, KernelResult};
use crate::reduce::{PutAlongAxisOptions, Reduce};
use scatterax_core::dense::{ravel_index, row_major_strides, unravel_index};
use scatterax_core::{Axis, DenseND, IndexElement, Shape, TensorElement};
use scirs2_core::numeric::Num;
use std::borrow::Cow;

const OPERATION: &str = "put_along_axis";

/// Values to scatter: a tensor or a single host scalar
#[derive(Debug, Clone, Copy)]
pub enum PutValues<'a, T> {
    /// Tensor of values, broadcast or windowed against the index
    Tensor(&'a DenseND<T>),
    /// One value written at every indexed position
    Scalar(T),
}

impl<'a, T> From<&'a DenseND<T>> for PutValues<'a, T> {
    fn from(tensor: &'a DenseND<T>) -> Self {
        PutValues::Tensor(tensor)
    }
}

impl<T> PutValues<'_, T>
where
    T: Clone + Num,
{
    /// Whether this is a host scalar
    pub fn is_scalar(&self) -> bool {
        matches!(self, PutValues::Scalar(_))
    }

    /// Shape of the values (empty for a scalar)
    pub fn shape(&self) -> &[usize] {
        match self {
            PutValues::Tensor(t) => t.shape(),
            PutValues::Scalar(_) => &[],
        }
    }
}

/// Where the per-write values of a plan came from
///
/// The backward pass uses this to map value gradients back to the shape the
/// caller supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// A host scalar; it receives no gradient
    Scalar,
    /// A tensor of `shape` broadcast to the index shape
    Broadcast { shape: Shape },
    /// A tensor of `shape` read at the index positions (broadcast disabled)
    Window { shape: Shape },
}

/// A validated, fully resolved scatter
///
/// `targets[k]` is the flat row-major offset into the input written by the
/// `k`-th index position, and `values[k]` the value written there.
#[derive(Debug, Clone)]
pub struct PutAlongAxisPlan<T> {
    /// Normalised scatter axis
    pub axis: Axis,
    /// Shape of the input (and output)
    pub input_shape: Shape,
    /// Shape of the index after broadcasting
    pub index_shape: Shape,
    /// Flat output offset of each write, in row-major index order
    pub targets: Vec<usize>,
    /// Value of each write
    pub values: Vec<T>,
    /// Reduction mode
    pub reduce: Reduce,
    /// Whether the input value participates in the reduction
    pub include_self: bool,
    /// Origin of `values`
    pub value_source: ValueSource,
}

impl<T> PutAlongAxisPlan<T>
where
    T: TensorElement,
{
    /// Number of writes
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the plan writes nothing
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Apply the writes to row-major `data` of the input shape
    pub fn apply(&self, data: &mut [T]) {
        if !self.include_self {
            let reset = match self.reduce {
                Reduce::Mul => T::one(),
                Reduce::Add | Reduce::Assign => T::zero(),
            };
            for &t in &self.targets {
                data[t] = reset;
            }
        }
        for (&t, &v) in self.targets.iter().zip(&self.values) {
            data[t] = match self.reduce {
                Reduce::Assign => v,
                Reduce::Add => data[t].reduce_add(v),
                Reduce::Mul => data[t].reduce_mul(v),
            };
        }
    }

    /// Apply the writes to a tensor of the input shape
    ///
    /// Tensors without a row-major slice are written through their logical
    /// element order.
    pub fn apply_to(&self, tensor: &mut DenseND<T>) {
        if let Some(data) = tensor.try_as_slice_mut() {
            self.apply(data);
            return;
        }
        let mut data = tensor.to_vec();
        self.apply(&mut data);
        for (slot, value) in tensor.iter_mut().zip(data) {
            *slot = value;
        }
    }

    /// Mask of input positions written at least once
    pub fn touched(&self) -> Vec<bool> {
        let total: usize = self.input_shape.iter().product();
        let mut mask = vec![false; total];
        for &t in &self.targets {
            mask[t] = true;
        }
        mask
    }

    /// For each write, whether no later write hits the same target
    pub fn last_writers(&self) -> Vec<bool> {
        let total: usize = self.input_shape.iter().product();
        let mut seen = vec![false; total];
        let mut last = vec![false; self.targets.len()];
        for (k, &t) in self.targets.iter().enumerate().rev() {
            if !seen[t] {
                seen[t] = true;
                last[k] = true;
            }
        }
        last
    }
}

/// Normalise a possibly negative axis into `[0, rank)`
///
/// ```
/// use scatterax_kernels::normalize_axis;
///
/// assert_eq!(normalize_axis(-1, 3).unwrap(), 2);
/// assert!(normalize_axis(3, 3).is_err());
/// assert!(normalize_axis(0, 0).is_err());
/// ```
pub fn normalize_axis(axis: isize, rank: usize) -> KernelResult<Axis> {
    let r = rank as isize;
    if axis < -r || axis >= r {
        return Err(invalid_axis(OPERATION, axis, rank));
    }
    Ok(if axis < 0 { axis + r } else { axis } as usize)
}

/// Validate arguments and resolve every write of a scatter
///
/// Checks run in this order: index rank against input rank, axis range,
/// option combination, shapes, then index values. All of them run before
/// anything is written.
pub fn prepare_put_along_axis<T, I>(
    input_shape: &[usize],
    index: &DenseND<I>,
    values: PutValues<'_, T>,
    axis: isize,
    opts: &PutAlongAxisOptions,
) -> KernelResult<PutAlongAxisPlan<T>>
where
    T: Copy + Num,
    I: IndexElement,
{
    let rank = input_shape.len();
    if index.rank() != rank {
        return Err(KernelError::RankMismatch {
            operation: OPERATION.to_string(),
            input_rank: rank,
            index_rank: index.rank(),
        });
    }
    let axis = normalize_axis(axis, rank)?;
    opts.validate(OPERATION)?;

    let (index, values, value_source) = if opts.broadcast {
        broadcast_operands(input_shape, index, values, axis)?
    } else {
        window_operands(input_shape, index, values, axis)?
    };
    let index_shape = Shape::from_slice(index.shape());

    for (dim, (&size, &limit)) in index_shape.iter().zip(input_shape).enumerate() {
        if dim != axis && size > limit {
            return Err(size_mismatch(OPERATION, "input", dim, size, limit));
        }
    }

    let axis_size = input_shape[axis];
    let strides = row_major_strides(input_shape);
    let mut coord = vec![0; rank];
    let mut targets = Vec::with_capacity(index.len());
    for (flat, raw) in index.iter().enumerate() {
        let position = raw.to_i64().unwrap_or(i64::MAX);
        if position < 0 || position as u64 >= axis_size as u64 {
            return Err(KernelError::IndexOutOfRange {
                operation: OPERATION.to_string(),
                index: position,
                axis,
                size: axis_size,
            });
        }
        unravel_index(flat, &index_shape, &mut coord);
        coord[axis] = position as usize;
        targets.push(ravel_index(&coord, &strides));
    }

    tracing::trace!(
        axis,
        reduce = %opts.reduce,
        include_self = opts.include_self,
        broadcast = opts.broadcast,
        writes = targets.len(),
        "put_along_axis plan ready"
    );

    Ok(PutAlongAxisPlan {
        axis,
        input_shape: Shape::from_slice(input_shape),
        index_shape,
        targets,
        values,
        reduce: opts.reduce,
        include_self: opts.include_self,
        value_source,
    })
}

type Operands<'i, I, T> = (Cow<'i, DenseND<I>>, Vec<T>, ValueSource);

/// Broadcast the index to the input's non-axis extent, then values to the index
fn broadcast_operands<'i, T, I>(
    input_shape: &[usize],
    index: &'i DenseND<I>,
    values: PutValues<'_, T>,
    axis: Axis,
) -> KernelResult<Operands<'i, I, T>>
where
    T: Copy + Num,
    I: IndexElement,
{
    let fits = index
        .shape()
        .iter()
        .zip(input_shape)
        .all(|(size, limit)| size <= limit);

    let index = if fits {
        let mut shape = input_shape.to_vec();
        shape[axis] = index.shape()[axis];
        if shape.as_slice() == index.shape() {
            Cow::Borrowed(index)
        } else {
            let broadcast = index
                .broadcast_to(&shape)
                .map_err(|_| KernelError::BroadcastMismatch {
                    operation: OPERATION.to_string(),
                    operand: "index",
                    from: index.shape_vec(),
                    to: shape.clone(),
                })?;
            Cow::Owned(broadcast)
        }
    } else {
        Cow::Borrowed(index)
    };

    let (data, source) = match values {
        PutValues::Scalar(v) => (vec![v; index.len()], ValueSource::Scalar),
        PutValues::Tensor(v) => {
            let data = if v.shape() == index.shape() {
                v.to_vec()
            } else {
                v.broadcast_to(index.shape())
                    .map_err(|_| KernelError::BroadcastMismatch {
                        operation: OPERATION.to_string(),
                        operand: "values",
                        from: v.shape_vec(),
                        to: index.shape_vec(),
                    })?
                    .into_vec()
            };
            (
                data,
                ValueSource::Broadcast {
                    shape: Shape::from_slice(v.shape()),
                },
            )
        }
    };
    Ok((index, data, source))
}

/// Read values at the index positions without broadcasting
fn window_operands<'i, T, I>(
    input_shape: &[usize],
    index: &'i DenseND<I>,
    values: PutValues<'_, T>,
    axis: Axis,
) -> KernelResult<Operands<'i, I, T>>
where
    T: Copy + Num,
    I: IndexElement,
{
    let v = match values {
        PutValues::Scalar(v) => {
            return Ok((
                Cow::Borrowed(index),
                vec![v; index.len()],
                ValueSource::Scalar,
            ))
        }
        PutValues::Tensor(v) => v,
    };

    if v.rank() != index.rank() {
        return Err(KernelError::ValuesRankMismatch {
            operation: OPERATION.to_string(),
            index_rank: index.rank(),
            values_rank: v.rank(),
        });
    }
    for (dim, (&size, &limit)) in index.shape().iter().zip(v.shape()).enumerate() {
        if dim != axis && size > input_shape[dim] {
            return Err(size_mismatch(
                OPERATION,
                "input",
                dim,
                size,
                input_shape[dim],
            ));
        }
        if size > limit {
            return Err(size_mismatch(OPERATION, "values", dim, size, limit));
        }
    }

    let data = if v.shape() == index.shape() {
        v.to_vec()
    } else {
        let flat = v.to_vec();
        let strides = row_major_strides(v.shape());
        let index_shape = index.shape();
        let mut coord = vec![0; index_shape.len()];
        (0..index.len())
            .map(|p| {
                unravel_index(p, index_shape, &mut coord);
                flat[ravel_index(&coord, &strides)]
            })
            .collect()
    };

    Ok((
        Cow::Borrowed(index),
        data,
        ValueSource::Window {
            shape: Shape::from_slice(v.shape()),
        },
    ))
}

/// Scatter `values` into a copy of `input` along `axis`
pub fn put_along_axis<T, I>(
    input: &DenseND<T>,
    index: &DenseND<I>,
    values: PutValues<'_, T>,
    axis: isize,
    opts: &PutAlongAxisOptions,
) -> KernelResult<DenseND<T>>
where
    T: TensorElement,
    I: IndexElement,
{
    let plan = prepare_put_along_axis(input.shape(), index, values, axis, opts)?;
    let mut out = input.clone();
    plan.apply_to(&mut out);
    tracing::debug!(
        shape = ?input.shape(),
        axis = plan.axis,
        reduce = %plan.reduce,
        writes = plan.len(),
        "put_along_axis"
    );
    Ok(out)
}

/// Scatter `values` into `input` itself
///
/// On error `input` is unchanged.
///
/// ```
/// use scatterax_core::DenseND;
/// use scatterax_kernels::{put_along_axis_, PutAlongAxisOptions, PutValues};
///
/// let mut x = DenseND::from_vec(vec![10.0, 30.0, 20.0], &[1, 3]).unwrap();
/// let index = DenseND::from_vec(vec![0_i32], &[1, 1]).unwrap();
/// put_along_axis_(&mut x, &index, PutValues::Scalar(99.0), 0, &PutAlongAxisOptions::default())
///     .unwrap();
/// assert_eq!(x.to_vec(), vec![99.0, 99.0, 99.0]);
///
/// let bad = DenseND::from_vec(vec![5_i32], &[1, 1]).unwrap();
/// assert!(put_along_axis_(&mut x, &bad, PutValues::Scalar(0.0), 0, &PutAlongAxisOptions::default())
///     .is_err());
/// assert_eq!(x.to_vec(), vec![99.0, 99.0, 99.0]);
/// ```
pub fn put_along_axis_<T, I>(
    input: &mut DenseND<T>,
    index: &DenseND<I>,
    values: PutValues<'_, T>,
    axis: isize,
    opts: &PutAlongAxisOptions,
) -> KernelResult<()>
where
    T: TensorElement,
    I: IndexElement,
{
    let plan = prepare_put_along_axis(input.shape(), index, values, axis, opts)?;
    plan.apply_to(input);
    tracing::debug!(
        shape = ?input.shape(),
        axis = plan.axis,
        reduce = %plan.reduce,
        writes = plan.len(),
        "put_along_axis_ (in place)"
    );
    Ok(())
}

/// Method-style access to the scatter on [`DenseND`]
pub trait PutAlongAxisExt<T> {
    /// See [`put_along_axis`]
    fn put_along_axis<I: IndexElement>(
        &self,
        index: &DenseND<I>,
        values: PutValues<'_, T>,
        axis: isize,
        opts: &PutAlongAxisOptions,
    ) -> KernelResult<DenseND<T>>;

    /// See [`put_along_axis_`]
    fn put_along_axis_<I: IndexElement>(
        &mut self,
        index: &DenseND<I>,
        values: PutValues<'_, T>,
        axis: isize,
        opts: &PutAlongAxisOptions,
    ) -> KernelResult<()>;
}

impl<T> PutAlongAxisExt<T> for DenseND<T>
where
    T: TensorElement,
{
    fn put_along_axis<I: IndexElement>(
        &self,
        index: &DenseND<I>,
        values: PutValues<'_, T>,
        axis: isize,
        opts: &PutAlongAxisOptions,
    ) -> KernelResult<DenseND<T>> {
        put_along_axis(self, index, values, axis, opts)
    }

    fn put_along_axis_<I: IndexElement>(
        &mut self,
        index: &DenseND<I>,
        values: PutValues<'_, T>,
        axis: isize,
        opts: &PutAlongAxisOptions,
    ) -> KernelResult<()> {
        put_along_axis_(self, index, values, axis, opts)
    }
}
