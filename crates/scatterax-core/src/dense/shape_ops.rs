//! Shape manipulation: reshape, broadcast, reverse broadcast and dtype casts

use super::functions::{broadcast_shape, row_major_strides, unravel_index};
use super::types::DenseND;
use scirs2_core::ndarray_ext::IxDyn;
use scirs2_core::numeric::{Num, NumCast, ToPrimitive};

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Reshape the tensor, keeping row-major element order
    ///
    /// ```
    /// use scatterax_core::DenseND;
    ///
    /// let t = DenseND::from_vec((1..=6).map(|v| v as f64).collect(), &[6]).unwrap();
    /// let r = t.reshape(&[2, 3]).unwrap();
    /// assert_eq!(r[&[1, 0]], 4.0);
    /// assert!(t.reshape(&[4]).is_err());
    /// ```
    pub fn reshape(&self, new_shape: &[usize]) -> anyhow::Result<Self> {
        let total: usize = new_shape.iter().product();
        if total != self.len() {
            anyhow::bail!(
                "Cannot reshape tensor of shape {:?} ({} elements) to {:?} ({} elements)",
                self.shape(),
                self.len(),
                new_shape,
                total
            );
        }
        Self::from_vec(self.to_vec(), new_shape)
    }

    /// Broadcast the tensor to `shape` following NumPy rules
    ///
    /// Missing leading dimensions are prepended; a dimension of size 1 is
    /// repeated to the target size. The result is an owned, contiguous tensor.
    ///
    /// ```
    /// use scatterax_core::DenseND;
    ///
    /// let v = DenseND::from_vec(vec![99.0], &[1]).unwrap();
    /// let b = v.broadcast_to(&[10, 1, 10]).unwrap();
    /// assert_eq!(b.shape(), &[10, 1, 10]);
    /// assert!(b.iter().all(|&x| x == 99.0));
    ///
    /// let bad = DenseND::from_vec(vec![1.0, 2.0], &[2]).unwrap();
    /// assert!(bad.broadcast_to(&[3]).is_err());
    /// ```
    pub fn broadcast_to(&self, shape: &[usize]) -> anyhow::Result<Self> {
        if self.shape() == shape {
            return Ok(self.clone());
        }
        let view = self.data.broadcast(IxDyn(shape)).ok_or_else(|| {
            anyhow::anyhow!(
                "Cannot broadcast tensor of shape {:?} to {:?}",
                self.shape(),
                shape
            )
        })?;
        Ok(Self {
            data: view.to_owned(),
        })
    }

    /// Sum-reduce a broadcast tensor back to `shape`
    ///
    /// This is the adjoint of [`broadcast_to`](Self::broadcast_to): every
    /// element is added into the position it was broadcast from.
    ///
    /// ```
    /// use scatterax_core::DenseND;
    ///
    /// let g = DenseND::<f64>::ones(&[2, 3]);
    /// let r = g.sum_to_shape(&[1, 3]).unwrap();
    /// assert_eq!(r.to_vec(), vec![2.0, 2.0, 2.0]);
    ///
    /// let s = g.sum_to_shape(&[]).unwrap();
    /// assert_eq!(s.to_vec(), vec![6.0]);
    /// ```
    pub fn sum_to_shape(&self, shape: &[usize]) -> anyhow::Result<Self> {
        if self.shape() == shape {
            return Ok(self.clone());
        }
        match broadcast_shape(shape, self.shape()) {
            Some(ref s) if s.as_slice() == self.shape() => {}
            _ => anyhow::bail!(
                "Shape {:?} does not broadcast to {:?}; cannot reduce",
                shape,
                self.shape()
            ),
        }

        let src_shape = self.shape_vec();
        let rank_diff = src_shape.len() - shape.len();
        let dst_strides = row_major_strides(shape);
        let total: usize = shape.iter().product();
        let mut out = vec![T::zero(); total];
        let mut idx = vec![0; src_shape.len()];

        for (flat, value) in self.data.iter().enumerate() {
            unravel_index(flat, &src_shape, &mut idx);
            let mut dst = 0;
            for (d, &dim) in shape.iter().enumerate() {
                if dim != 1 {
                    dst += idx[rank_diff + d] * dst_strides[d];
                }
            }
            out[dst] = out[dst].clone() + value.clone();
        }

        Self::from_vec(out, shape)
    }
}

impl<T> DenseND<T>
where
    T: Clone + Num + ToPrimitive,
{
    /// Convert every element to another numeric type
    ///
    /// Fails if any element is not representable in `U` (for example a NaN
    /// cast to an integer type).
    ///
    /// ```
    /// use scatterax_core::DenseND;
    ///
    /// let t = DenseND::from_vec(vec![1.5_f64, 2.5], &[2]).unwrap();
    /// let f = t.cast::<f32>().unwrap();
    /// assert_eq!(f.to_vec(), vec![1.5_f32, 2.5]);
    /// ```
    pub fn cast<U>(&self) -> anyhow::Result<DenseND<U>>
    where
        U: Clone + Num + NumCast,
    {
        let data = self
            .data
            .iter()
            .map(|v| {
                <U as NumCast>::from(v.clone()).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Element cannot be represented in {}",
                        std::any::type_name::<U>()
                    )
                })
            })
            .collect::<anyhow::Result<Vec<U>>>()?;
        DenseND::from_vec(data, self.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_to_prepends_dims() {
        let t = DenseND::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let b = t.broadcast_to(&[3, 2]).unwrap();
        assert_eq!(b.to_vec(), vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_broadcast_scalar_tensor() {
        let s = DenseND::scalar(7_i64);
        let b = s.broadcast_to(&[2, 2]).unwrap();
        assert_eq!(b.to_vec(), vec![7, 7, 7, 7]);
    }

    #[test]
    fn test_broadcast_rejects_shrinking() {
        let t = DenseND::<f64>::ones(&[2, 3]);
        assert!(t.broadcast_to(&[3]).is_err());
    }

    #[test]
    fn test_sum_to_shape_middle_axis() {
        let t = DenseND::from_vec((0..12).map(|v| v as f64).collect(), &[2, 3, 2]).unwrap();
        let r = t.sum_to_shape(&[2, 1, 2]).unwrap();
        // [0+2+4, 1+3+5, 6+8+10, 7+9+11]
        assert_eq!(r.to_vec(), vec![6.0, 9.0, 24.0, 27.0]);
    }

    #[test]
    fn test_sum_to_shape_rejects_incompatible() {
        let t = DenseND::<f64>::ones(&[2, 3]);
        assert!(t.sum_to_shape(&[2]).is_err());
    }

    #[test]
    fn test_cast_nan_to_int_fails() {
        let t = DenseND::from_vec(vec![f64::NAN], &[1]).unwrap();
        assert!(t.cast::<i64>().is_err());
    }
}
