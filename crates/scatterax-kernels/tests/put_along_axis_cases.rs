//! Forward-value tests for put_along_axis against the reference oracle

use half::{bf16, f16};
use scatterax_core::DenseND;
use scatterax_kernels::reference::{numpy_put_along_axis, reference_put_along_axis};
use scatterax_kernels::{
    put_along_axis, put_along_axis_, ErrorCategory, KernelError, PutAlongAxisExt,
    PutAlongAxisOptions, PutValues, Reduce,
};

fn assert_close(actual: &[f64], expected: &[f64], rtol: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= rtol * e.abs().max(1.0),
            "mismatch at {}: {} vs {}",
            i,
            a,
            e
        );
    }
}

#[test]
fn test_cube_single_index_f64() {
    let x = DenseND::<f64>::random_uniform(&[10, 10, 10], 0.0, 1.0);
    let index = DenseND::from_vec(vec![0_i32], &[1, 1, 1]).unwrap();
    let value = DenseND::from_vec(vec![99.0], &[1]).unwrap();

    let out = put_along_axis(
        &x,
        &index,
        PutValues::Tensor(&value),
        1,
        &PutAlongAxisOptions::default(),
    )
    .unwrap();
    let expected = numpy_put_along_axis(&x, &index, &value, 1).unwrap();
    assert_eq!(out, expected);

    for i in 0..10 {
        for k in 0..10 {
            assert_eq!(out[&[i, 0, k]], 99.0);
            assert_eq!(out[&[i, 1, k]], x[&[i, 1, k]]);
        }
    }
}

#[test]
fn test_cube_single_index_f16() {
    let x = DenseND::<f16>::random_uniform(&[10, 10, 10], 0.0, 1.0);
    let index = DenseND::from_vec(vec![0_i64], &[1, 1, 1]).unwrap();
    let value = DenseND::from_vec(vec![f16::from_f32(99.0)], &[1]).unwrap();

    let out = put_along_axis(
        &x,
        &index,
        PutValues::Tensor(&value),
        1,
        &PutAlongAxisOptions::default(),
    )
    .unwrap();
    let expected = numpy_put_along_axis(&x, &index, &value, 1).unwrap();
    assert_eq!(out, expected);
    assert_eq!(f32::from(out[&[3, 0, 7]]), 99.0);
}

#[test]
fn test_cube_single_index_bf16() {
    let x = DenseND::<bf16>::random_uniform(&[10, 10, 10], 0.0, 1.0);
    let index = DenseND::from_vec(vec![0_i32], &[1, 1, 1]).unwrap();
    let value = DenseND::from_vec(vec![bf16::from_f32(99.0)], &[1]).unwrap();

    let out = put_along_axis(
        &x,
        &index,
        PutValues::Tensor(&value),
        1,
        &PutAlongAxisOptions::default(),
    )
    .unwrap();
    let expected = numpy_put_along_axis(&x, &index, &value, 1).unwrap();
    assert_eq!(out, expected);
}

#[test]
fn test_zero_index_without_broadcast() {
    let x = DenseND::<f32>::random_uniform(&[10, 10, 10], 0.0, 1.0);
    let values = DenseND::<f32>::arange(1.0, 126.0, 1.0)
        .reshape(&[5, 5, 5])
        .unwrap();
    let index = DenseND::<i64>::zeros(&[5, 5, 5]);
    let opts = PutAlongAxisOptions::new().with_broadcast(false);

    let out = put_along_axis(&x, &index, PutValues::Tensor(&values), 1, &opts).unwrap();

    let mut expected = x.clone();
    for i in 0..5 {
        for j in 0..5 {
            for k in 0..5 {
                let target = index[&[i, j, k]] as usize;
                expected[&[i, target, k]] = values[&[i, j, k]];
            }
        }
    }
    assert_eq!(out, expected);
    // last writer along j wins
    assert_eq!(out[&[0, 0, 0]], 21.0);
}

fn api_cases() -> Vec<(Vec<usize>, DenseND<i64>)> {
    vec![
        (vec![1, 3], DenseND::from_vec(vec![0], &[1, 1]).unwrap()),
        (
            vec![2, 2],
            DenseND::from_vec(vec![0, 0, 1, 0], &[2, 2]).unwrap(),
        ),
        (
            vec![2, 2],
            DenseND::from_vec(vec![0, 0, 1, 0, 0, 0, 1, 0], &[4, 2]).unwrap(),
        ),
    ]
}

#[test]
fn test_api_cases_scalar_value() {
    let opts = PutAlongAxisOptions::default();
    for (shape, index) in api_cases() {
        let x = DenseND::<f32>::random_uniform(&shape, 0.0, 1.0);
        let out = put_along_axis(&x, &index, PutValues::Scalar(99.0), 0, &opts).unwrap();

        let value = DenseND::scalar(99.0_f32);
        let expected = numpy_put_along_axis(&x, &index, &value, 0).unwrap();
        assert_close(
            &out.iter().map(|&v| v as f64).collect::<Vec<_>>(),
            &expected.iter().map(|&v| v as f64).collect::<Vec<_>>(),
            1e-3,
        );

        // a rank-0 tensor value behaves like the scalar
        let from_tensor = put_along_axis(&x, &index, PutValues::Tensor(&value), 0, &opts).unwrap();
        assert_eq!(from_tensor, out);

        for reduce in [Reduce::Mul, Reduce::Add] {
            let o = opts.with_reduce(reduce);
            assert!(put_along_axis(&x, &index, PutValues::Scalar(99.0), 0, &o).is_ok());
        }
    }
}

#[test]
fn test_api_cases_inplace_matches() {
    let opts = PutAlongAxisOptions::default();
    for (shape, index) in api_cases().into_iter().take(2) {
        let x = DenseND::<f32>::random_uniform(&shape, 0.0, 1.0);
        let out = x
            .put_along_axis(&index, PutValues::Scalar(99.0), 0, &opts)
            .unwrap();
        let mut y = x.clone();
        put_along_axis_(&mut y, &index, PutValues::Scalar(99.0), 0, &opts).unwrap();
        assert_eq!(y, out);
    }
}

#[test]
fn test_window_values_on_both_axes() {
    let x = DenseND::<f32>::zeros(&[3, 5]);
    let values = DenseND::<f32>::arange(1.0, 11.0, 1.0)
        .reshape(&[2, 5])
        .unwrap();
    let opts = PutAlongAxisOptions::new().with_broadcast(false);

    let index1 = DenseND::from_vec(vec![0_i64, 1, 2, 0], &[1, 4]).unwrap();
    let out = put_along_axis(&x, &index1, PutValues::Tensor(&values), 0, &opts).unwrap();
    let mut expected = x.clone();
    for j in 0..4 {
        expected[&[index1[&[0, j]] as usize, j]] = values[&[0, j]];
    }
    assert_eq!(out, expected);

    let index2 = DenseND::from_vec(vec![0_i64, 1, 2, 0, 1, 4], &[2, 3]).unwrap();
    let out = put_along_axis(&x, &index2, PutValues::Tensor(&values), 1, &opts).unwrap();
    let mut expected = x.clone();
    for i in 0..2 {
        for j in 0..3 {
            expected[&[i, index2[&[i, j]] as usize]] = values[&[i, j]];
        }
    }
    assert_eq!(out, expected);

    for reduce in [Reduce::Mul, Reduce::Add] {
        let o = opts.with_reduce(reduce);
        assert!(put_along_axis(&x, &index1, PutValues::Tensor(&values), 0, &o).is_ok());
        assert!(put_along_axis(&x, &index2, PutValues::Tensor(&values), 1, &o).is_ok());
    }
}

#[test]
fn test_error_categories() {
    let x = DenseND::from_vec(vec![1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    let no_bcast = PutAlongAxisOptions::new().with_broadcast(false);

    // index rank differs from input rank
    let index = DenseND::from_vec(vec![1_i32], &[1]).unwrap();
    let err = put_along_axis(&x, &index, PutValues::Scalar(1.0), 0, &no_bcast).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Value);

    // values rank differs from index rank
    let index = DenseND::from_vec(vec![1_i32], &[1, 1]).unwrap();
    let values = DenseND::from_vec(vec![2.0_f32], &[1]).unwrap();
    let err = put_along_axis(&x, &index, PutValues::Tensor(&values), 0, &no_bcast).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Value);

    // index larger than the input
    let index = DenseND::from_vec((1..=12).collect::<Vec<i32>>(), &[3, 4]).unwrap();
    let err = put_along_axis(&x, &index, PutValues::Scalar(1.0), 0, &no_bcast).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Runtime);

    // index value out of range
    let index = DenseND::from_vec(vec![10_i32], &[1, 1]).unwrap();
    let err = put_along_axis(&x, &index, PutValues::Scalar(1.0), 0, &no_bcast).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Runtime);

    // include_self=false with assign wins over the out-of-range index
    let opts = PutAlongAxisOptions::new().with_include_self(false);
    let err = put_along_axis(&x, &index, PutValues::Scalar(1.0), 0, &opts).unwrap_err();
    assert!(matches!(err, KernelError::IncludeSelfWithAssign { .. }));
    assert_eq!(err.category(), ErrorCategory::Value);
}

#[test]
fn test_duplicate_indices_match_reference() {
    let x = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    let index = DenseND::from_vec(vec![0_i64, 0, 2, 1, 1, 1], &[2, 3]).unwrap();
    let values = DenseND::from_vec(vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0], &[2, 3]).unwrap();

    for reduce in [Reduce::Assign, Reduce::Add, Reduce::Mul] {
        for include_self in [true, false] {
            if reduce == Reduce::Assign && !include_self {
                continue;
            }
            let opts = PutAlongAxisOptions::new()
                .with_reduce(reduce)
                .with_include_self(include_self);
            let out = put_along_axis(&x, &index, PutValues::Tensor(&values), 1, &opts).unwrap();
            let expected =
                reference_put_along_axis(&x, &index, &values, 1, reduce, include_self).unwrap();
            assert_eq!(out, expected, "reduce={} include_self={}", reduce, include_self);
        }
    }
}
