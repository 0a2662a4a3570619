//! Element access on tensors
//!
//! Non-panicking element access used by the kernels and the reference
//! implementations.

use super::types::DenseND;
use scirs2_core::numeric::Num;

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Get an element by index without panicking
    ///
    /// # Examples
    ///
    /// ```
    /// use scatterax_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// assert_eq!(tensor.get(&[0, 1]), Some(&2.0));
    /// assert_eq!(tensor.get(&[5, 5]), None);
    /// ```
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.rank() {
            return None;
        }
        self.data.get(index)
    }

    /// Get a mutable reference to an element by index without panicking
    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut T> {
        if index.len() != self.rank() {
            return None;
        }
        self.data.get_mut(index)
    }

    /// Get an element by index, with a descriptive error when out of bounds
    ///
    /// ```
    /// use scatterax_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::zeros(&[2, 3]);
    /// assert!(tensor.get_checked(&[1, 2]).is_ok());
    /// assert!(tensor.get_checked(&[2, 0]).is_err());
    /// assert!(tensor.get_checked(&[0]).is_err());
    /// ```
    pub fn get_checked(&self, index: &[usize]) -> anyhow::Result<&T> {
        if index.len() != self.rank() {
            anyhow::bail!(
                "Index rank {} does not match tensor rank {}",
                index.len(),
                self.rank()
            );
        }
        self.data.get(index).ok_or_else(|| {
            anyhow::anyhow!(
                "Index {:?} out of bounds for tensor of shape {:?}",
                index,
                self.shape()
            )
        })
    }

    /// Get the underlying data as a slice if the tensor is contiguous
    pub fn try_as_slice(&self) -> Option<&[T]> {
        self.data.as_slice()
    }

    /// Get the underlying data as a mutable slice if the tensor is contiguous
    pub fn try_as_slice_mut(&mut self) -> Option<&mut [T]> {
        self.data.as_slice_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_mut_writes_through() {
        let mut tensor = DenseND::<f64>::zeros(&[2, 2]);
        if let Some(v) = tensor.get_mut(&[1, 0]) {
            *v = 3.0;
        }
        assert_eq!(tensor[&[1, 0]], 3.0);
        assert!(tensor.get_mut(&[2, 0]).is_none());
    }

    #[test]
    fn test_get_on_scalar() {
        let s = DenseND::scalar(4.0_f64);
        assert_eq!(s.get(&[]), Some(&4.0));
        assert_eq!(s.get(&[0]), None);
    }

    #[test]
    fn test_try_as_slice_mut_contiguous() {
        let mut tensor = DenseND::<f64>::zeros(&[4]);
        if let Some(slice) = tensor.try_as_slice_mut() {
            slice[3] = 40.0;
        }
        assert_eq!(tensor[&[3]], 40.0);
    }
}
