//! Shape arithmetic shared by the dense tensor operations
//!
//! Everything here works on plain `&[usize]` shapes in row-major order so the
//! kernels can reuse it without going through a tensor.

/// Check whether two shapes are broadcast-compatible (NumPy rules).
///
/// ```
/// use scatterax_core::dense::shapes_broadcastable;
///
/// assert!(shapes_broadcastable(&[10, 1, 10], &[1]));
/// assert!(shapes_broadcastable(&[4, 2], &[2]));
/// assert!(!shapes_broadcastable(&[4, 2], &[3]));
/// ```
pub fn shapes_broadcastable(shape1: &[usize], shape2: &[usize]) -> bool {
    let len1 = shape1.len();
    let len2 = shape2.len();
    let max_len = len1.max(len2);
    for i in 0..max_len {
        let dim1 = if i < len1 { shape1[len1 - 1 - i] } else { 1 };
        let dim2 = if i < len2 { shape2[len2 - 1 - i] } else { 1 };
        if dim1 != dim2 && dim1 != 1 && dim2 != 1 {
            return false;
        }
    }
    true
}

/// Compute the broadcast shape of two shapes, or `None` if incompatible.
///
/// ```
/// use scatterax_core::dense::broadcast_shape;
///
/// assert_eq!(broadcast_shape(&[5, 1], &[1, 3]), Some(vec![5, 3]));
/// assert_eq!(broadcast_shape(&[], &[2, 2]), Some(vec![2, 2]));
/// assert_eq!(broadcast_shape(&[2], &[3]), None);
/// ```
pub fn broadcast_shape(shape1: &[usize], shape2: &[usize]) -> Option<Vec<usize>> {
    if !shapes_broadcastable(shape1, shape2) {
        return None;
    }
    let len1 = shape1.len();
    let len2 = shape2.len();
    let max_len = len1.max(len2);
    let mut result = Vec::with_capacity(max_len);
    for i in 0..max_len {
        let dim1 = if i < len1 { shape1[len1 - 1 - i] } else { 1 };
        let dim2 = if i < len2 { shape2[len2 - 1 - i] } else { 1 };
        // a zero-sized dim only broadcasts against 1
        result.push(if dim1 == 1 { dim2 } else { dim1 });
    }
    result.reverse();
    Some(result)
}

/// Row-major strides for `shape`.
///
/// ```
/// use scatterax_core::dense::row_major_strides;
///
/// assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
/// assert!(row_major_strides(&[]).is_empty());
/// ```
pub fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Convert a flat row-major offset into a multi-index, writing into `out`.
///
/// `out` must have the same length as `shape`.
pub fn unravel_index(mut flat: usize, shape: &[usize], out: &mut [usize]) {
    debug_assert_eq!(shape.len(), out.len());
    for d in (0..shape.len()).rev() {
        let dim = shape[d];
        if dim == 0 {
            out[d] = 0;
            continue;
        }
        out[d] = flat % dim;
        flat /= dim;
    }
}

/// Convert a multi-index into a flat row-major offset.
pub fn ravel_index(index: &[usize], strides: &[usize]) -> usize {
    index.iter().zip(strides).map(|(i, s)| i * s).sum()
}
