//! Reference implementations used to check the kernels
//!
//! Both functions here walk the index with an explicit coordinate counter
//! and write element by element. They share no code with
//! [`put_along_axis`](crate::put_along_axis::put_along_axis) beyond the
//! tensor type, which keeps them useful as an independent oracle in tests
//! and benchmarks.

use crate::reduce::Reduce;
use anyhow::{anyhow, bail, Result};
use scatterax_core::dense::broadcast_shape;
use scatterax_core::{Axis, DenseND, IndexElement, TensorElement};
use scirs2_core::numeric::Num;

/// Advance `coord` to the next row-major position within `shape`
///
/// Returns `false` once every position has been visited.
fn next_coord(coord: &mut [usize], shape: &[usize]) -> bool {
    for d in (0..shape.len()).rev() {
        coord[d] += 1;
        if coord[d] < shape[d] {
            return true;
        }
        coord[d] = 0;
    }
    false
}

fn to_axis_position<I: IndexElement>(raw: I, size: usize) -> Result<usize> {
    let position = raw
        .to_i64()
        .ok_or_else(|| anyhow!("index {} is not representable", raw))?;
    if position < 0 || position as u64 >= size as u64 {
        bail!("index {} is out of range for axis of size {}", position, size);
    }
    Ok(position as usize)
}

/// Assign-only scatter with NumPy `put_along_axis` semantics
///
/// `indices` is broadcast against `arr` in every dimension except `axis`,
/// and `values` is broadcast to the resulting index shape.
///
/// ```
/// use scatterax_core::DenseND;
/// use scatterax_kernels::reference::numpy_put_along_axis;
///
/// let arr = DenseND::<f64>::zeros(&[2, 3]);
/// let idx = DenseND::from_vec(vec![1_i64], &[1, 1]).unwrap();
/// let v = DenseND::from_vec(vec![5.0], &[1]).unwrap();
/// let out = numpy_put_along_axis(&arr, &idx, &v, 1).unwrap();
/// assert_eq!(out.to_vec(), vec![0.0, 5.0, 0.0, 0.0, 5.0, 0.0]);
/// ```
pub fn numpy_put_along_axis<T, I>(
    arr: &DenseND<T>,
    indices: &DenseND<I>,
    values: &DenseND<T>,
    axis: Axis,
) -> Result<DenseND<T>>
where
    T: Copy + Num,
    I: IndexElement,
{
    if indices.rank() != arr.rank() {
        bail!(
            "indices rank {} must match array rank {}",
            indices.rank(),
            arr.rank()
        );
    }
    if axis >= arr.rank() {
        bail!("axis {} out of bounds for rank {}", axis, arr.rank());
    }

    let mut fancy = arr.shape_vec();
    fancy[axis] = 1;
    let shape = broadcast_shape(indices.shape(), &fancy).ok_or_else(|| {
        anyhow!(
            "indices of shape {:?} do not broadcast against {:?}",
            indices.shape(),
            arr.shape()
        )
    })?;
    let indices = indices.broadcast_to(&shape)?;
    let values = values.broadcast_to(&shape)?;

    let mut out = arr.clone();
    if shape.iter().any(|&d| d == 0) {
        return Ok(out);
    }
    let axis_size = arr.shape()[axis];
    let mut coord = vec![0; shape.len()];
    loop {
        let mut target = coord.clone();
        target[axis] = to_axis_position(indices[&coord[..]], axis_size)?;
        out[&target[..]] = values[&coord[..]];
        if !next_coord(&mut coord, &shape) {
            break;
        }
    }
    Ok(out)
}

/// Explicit-loop scatter supporting every reduce mode
///
/// `values` must already have the index's shape. `include_self = false`
/// resets each touched target to the reduction identity before any write.
///
/// ```
/// use scatterax_core::DenseND;
/// use scatterax_kernels::reference::reference_put_along_axis;
/// use scatterax_kernels::Reduce;
///
/// let x = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let idx = DenseND::from_vec(vec![0_i32, 0], &[2]).unwrap();
/// let v = DenseND::from_vec(vec![10.0, 20.0], &[2]).unwrap();
/// let out = reference_put_along_axis(&x, &idx, &v, 0, Reduce::Add, false).unwrap();
/// assert_eq!(out.to_vec(), vec![30.0, 2.0, 3.0]);
/// ```
pub fn reference_put_along_axis<T, I>(
    x: &DenseND<T>,
    index: &DenseND<I>,
    values: &DenseND<T>,
    axis: Axis,
    reduce: Reduce,
    include_self: bool,
) -> Result<DenseND<T>>
where
    T: TensorElement,
    I: IndexElement,
{
    if index.shape() != values.shape() {
        bail!(
            "values shape {:?} must equal index shape {:?}",
            values.shape(),
            index.shape()
        );
    }
    if index.rank() != x.rank() || axis >= x.rank() {
        bail!("index rank or axis does not fit input of rank {}", x.rank());
    }

    let mut out = x.clone();
    let shape = index.shape_vec();
    if shape.iter().any(|&d| d == 0) {
        return Ok(out);
    }
    let axis_size = x.shape()[axis];

    if !include_self {
        let identity = match reduce {
            Reduce::Mul => T::one(),
            Reduce::Add | Reduce::Assign => T::zero(),
        };
        let mut coord = vec![0; shape.len()];
        loop {
            let mut target = coord.clone();
            target[axis] = to_axis_position(index[&coord[..]], axis_size)?;
            out[&target[..]] = identity;
            if !next_coord(&mut coord, &shape) {
                break;
            }
        }
    }

    let mut coord = vec![0; shape.len()];
    loop {
        let mut target = coord.clone();
        target[axis] = to_axis_position(index[&coord[..]], axis_size)?;
        let v = values[&coord[..]];
        let current = out[&target[..]];
        out[&target[..]] = match reduce {
            Reduce::Assign => v,
            Reduce::Add => current.reduce_add(v),
            Reduce::Mul => current.reduce_mul(v),
        };
        if !next_coord(&mut coord, &shape) {
            break;
        }
    }
    Ok(out)
}
