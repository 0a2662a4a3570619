//! Tensor creation and initialization methods
//!
//! This module provides methods for creating and initializing DenseND tensors
//! with various patterns (random, ranges, etc.).

use super::types::DenseND;
use scirs2_core::ndarray_ext::{Array, IxDyn};
use scirs2_core::numeric::{Num, NumCast};

impl<T> DenseND<T>
where
    T: Clone + Num + NumCast,
{
    /// Create a tensor with random values from a uniform distribution
    ///
    /// Uses scirs2_core::random for RNG (never rand/rand_distr directly).
    /// Samples are drawn in `f64` and converted to `T`.
    ///
    /// # Arguments
    ///
    /// * `shape` - The shape of the tensor
    /// * `low` - Lower bound (inclusive)
    /// * `high` - Upper bound (exclusive)
    ///
    /// # Examples
    ///
    /// ```
    /// use scatterax_core::dense::DenseND;
    ///
    /// let tensor = DenseND::<f32>::random_uniform(&[2, 3], 0.0, 1.0);
    /// assert_eq!(tensor.shape(), &[2, 3]);
    /// assert!(tensor.iter().all(|&v| (0.0..=1.0).contains(&v)));
    /// ```
    pub fn random_uniform(shape: &[usize], low: f64, high: f64) -> Self {
        use scirs2_core::random::quick::random_f64;
        let range = high - low;
        let zero = T::zero();
        Self {
            data: Array::from_shape_fn(IxDyn(shape), |_| {
                let sample: f64 = low + random_f64() * range;
                <T as NumCast>::from(sample).unwrap_or_else(|| zero.clone())
            }),
        }
    }

    /// Create a 1-D tensor with values `start, start + step, ...` below `stop`
    ///
    /// ```
    /// use scatterax_core::dense::DenseND;
    ///
    /// let t = DenseND::<f32>::arange(1.0, 126.0, 1.0);
    /// assert_eq!(t.shape(), &[125]);
    /// assert_eq!(t[&[124]], 125.0);
    ///
    /// let i = DenseND::<i64>::arange(0.0, 4.0, 1.0);
    /// assert_eq!(i.to_vec(), vec![0, 1, 2, 3]);
    /// ```
    pub fn arange(start: f64, stop: f64, step: f64) -> Self {
        let mut data = Vec::new();
        if step != 0.0 {
            let mut value = start;
            while (step > 0.0 && value < stop) || (step < 0.0 && value > stop) {
                if let Some(v) = <T as NumCast>::from(value) {
                    data.push(v);
                }
                value += step;
            }
        }
        let len = data.len();
        Self {
            data: Array::from_shape_vec(IxDyn(&[len]), data)
                .unwrap_or_else(|_| Array::zeros(IxDyn(&[0]))),
        }
    }

    /// Build a tensor of the given shape from `f64` values
    ///
    /// Convenient for fixtures written as float literals regardless of the
    /// target element type.
    ///
    /// ```
    /// use scatterax_core::dense::DenseND;
    ///
    /// let idx = DenseND::<i32>::from_f64_vec(&[0.0, 1.0, 2.0, 0.0], &[1, 4]).unwrap();
    /// assert_eq!(idx[&[0, 2]], 2);
    /// ```
    pub fn from_f64_vec(values: &[f64], shape: &[usize]) -> anyhow::Result<Self> {
        let data = values
            .iter()
            .map(|&v| {
                <T as NumCast>::from(v).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Value {} cannot be represented in {}",
                        v,
                        std::any::type_name::<T>()
                    )
                })
            })
            .collect::<anyhow::Result<Vec<T>>>()?;
        Self::from_vec(data, shape)
    }
}
