//! Integration tests for scatterax-core
//!
//! These tests verify end-to-end functionality and cross-module interactions.

use scatterax_core::{bf16, f16, DType, DenseND, TensorValue};

#[test]
fn test_broadcast_then_reduce_restores_scale() {
    let v = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[1, 3]).unwrap();
    let b = v.broadcast_to(&[4, 3]).unwrap();
    let r = b.sum_to_shape(&[1, 3]).unwrap();
    assert_eq!(r.to_vec(), vec![4.0, 8.0, 12.0]);
}

#[test]
fn test_index_broadcast_like_fixture() {
    // index [[[0]]] broadcast across a (10, 1, 10) slice
    let idx = DenseND::from_vec(vec![0_i64], &[1, 1, 1]).unwrap();
    let b = idx.broadcast_to(&[10, 1, 10]).unwrap();
    assert_eq!(b.shape(), &[10, 1, 10]);
    assert!(b.iter().all(|&v| v == 0));
}

#[test]
fn test_tensor_value_dtypes() {
    let values = [
        TensorValue::from(DenseND::<f16>::zeros(&[1])),
        TensorValue::from(DenseND::<bf16>::zeros(&[1])),
        TensorValue::from(DenseND::<f32>::zeros(&[1])),
        TensorValue::from(DenseND::<f64>::zeros(&[1])),
        TensorValue::from(DenseND::<i32>::zeros(&[1])),
        TensorValue::from(DenseND::<i64>::zeros(&[1])),
    ];
    let dtypes: Vec<DType> = values.iter().map(|v| v.dtype()).collect();
    assert_eq!(
        dtypes,
        vec![
            DType::F16,
            DType::BF16,
            DType::F32,
            DType::F64,
            DType::I32,
            DType::I64
        ]
    );
}

#[test]
fn test_scalar_tensor_value() {
    let s = TensorValue::from(DenseND::scalar(99.0_f32));
    assert_eq!(s.rank(), 0);
    assert_eq!(s.len(), 1);
    assert_eq!(s.to_f64_vec(), vec![99.0]);
}

#[test]
fn test_bf16_cast_precision() {
    let t = DenseND::from_vec(vec![99.0_f32, 0.1], &[2]).unwrap();
    let b = t.cast::<bf16>().unwrap();
    let back = b.cast::<f32>().unwrap();
    assert_eq!(back[&[0]], 99.0);
    assert!((back[&[1]] - 0.1).abs() < 1e-2);
}
