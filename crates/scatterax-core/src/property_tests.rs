//! Property-based tests for shape arithmetic and broadcasting
//!
//! Broadcasting feeds the value path of the scatter kernels and
//! `sum_to_shape` is its adjoint, so both are checked over random shapes.

#[cfg(test)]
mod tests {
    use crate::dense::{broadcast_shape, ravel_index, row_major_strides, unravel_index};
    use crate::DenseND;
    use proptest::prelude::*;

    fn shape_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..5, 1..=4)
    }

    // A shape plus a mask of dims to collapse to 1
    fn collapsible_shape() -> impl Strategy<Value = (Vec<usize>, Vec<bool>)> {
        shape_strategy().prop_flat_map(|shape| {
            let n = shape.len();
            (Just(shape), prop::collection::vec(any::<bool>(), n))
        })
    }

    proptest! {
        #[test]
        fn prop_unravel_ravel_roundtrip(shape in shape_strategy(), seed in 0usize..1000) {
            let total: usize = shape.iter().product();
            let flat = seed % total;
            let strides = row_major_strides(&shape);
            let mut idx = vec![0; shape.len()];
            unravel_index(flat, &shape, &mut idx);
            prop_assert!(idx.iter().zip(&shape).all(|(i, d)| i < d));
            prop_assert_eq!(ravel_index(&idx, &strides), flat);
        }

        #[test]
        fn prop_broadcast_shape_symmetric(a in shape_strategy(), b in shape_strategy()) {
            prop_assert_eq!(broadcast_shape(&a, &b), broadcast_shape(&b, &a));
        }

        #[test]
        fn prop_broadcast_then_sum_scales((shape, mask) in collapsible_shape()) {
            let small: Vec<usize> = shape
                .iter()
                .zip(&mask)
                .map(|(&d, &collapse)| if collapse { 1 } else { d })
                .collect();
            let n: usize = small.iter().product();
            let data: Vec<f64> = (0..n).map(|i| i as f64 + 1.0).collect();
            let t = DenseND::from_vec(data, &small).unwrap();

            let b = t.broadcast_to(&shape).unwrap();
            prop_assert_eq!(b.shape(), shape.as_slice());

            let factor: usize = shape.iter().product::<usize>() / n;
            let back = b.sum_to_shape(&small).unwrap();
            for (x, y) in back.iter().zip(t.iter()) {
                prop_assert!((x - y * factor as f64).abs() < 1e-9);
            }
        }

        #[test]
        fn prop_sum_to_scalar_preserves_total(shape in shape_strategy()) {
            let n: usize = shape.iter().product();
            let t = DenseND::from_vec((0..n).map(|i| i as f64).collect(), &shape).unwrap();
            let s = t.sum_to_shape(&[]).unwrap();
            let expected: f64 = (0..n).map(|i| i as f64).sum();
            prop_assert_eq!(s.to_vec(), vec![expected]);
        }

        #[test]
        fn prop_reshape_preserves_order(shape in shape_strategy()) {
            let n: usize = shape.iter().product();
            let t = DenseND::from_vec((0..n as i64).collect(), &shape).unwrap();
            let flat = t.reshape(&[n]).unwrap();
            prop_assert_eq!(flat.to_vec(), t.to_vec());
            let back = flat.reshape(&shape).unwrap();
            prop_assert_eq!(back, t);
        }
    }
}
