//! # scatterax-core
//!
//! Core tensor types for scatterax.
//!
//! This crate provides the foundational building blocks used by the
//! put-along-axis kernels, their gradients and the executors:
//!
//! - **Dense tensor representation** ([`DenseND`]) for base, index and value tensors
//! - **Element types** ([`DType`], [`TensorElement`]) covering `f16`, `bf16`,
//!   `f32`, `f64`, `i32` and `i64`
//! - **Dynamic tensors** ([`TensorValue`]) for APIs where the dtype is a runtime property
//! - **Broadcasting** ([`DenseND::broadcast_to`], [`DenseND::sum_to_shape`])
//!
//! ## SciRS2 Integration
//!
//! Arrays and numeric traits come from `scirs2-core`; half-precision element
//! types come from `half` (with its `num-traits` integration).
//!
//! ## Quick Start
//!
//! ```
//! use scatterax_core::DenseND;
//!
//! let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
//! assert_eq!(tensor.shape(), &[2, 3, 4]);
//!
//! let value = DenseND::from_vec(vec![99.0], &[1]).unwrap();
//! let broadcast = value.broadcast_to(&[2, 1, 4]).unwrap();
//! assert_eq!(broadcast.len(), 8);
//! ```
//!
//! ## Error Handling
//!
//! Operations return `Result<T, anyhow::Error>`:
//!
//! ```
//! use scatterax_core::DenseND;
//!
//! let tensor = DenseND::<f64>::zeros(&[2, 3]);
//! assert!(tensor.reshape(&[7]).is_err());
//! assert!(tensor.broadcast_to(&[4, 3]).is_err());
//! ```

#![deny(warnings)]

pub mod dense;
pub mod types;

#[cfg(test)]
mod property_tests;

pub use half::{bf16, f16};
pub use types::{
    Axis, DType, DenseND, FloatElement, IndexElement, Rank, Shape, TensorElement, TensorValue,
};
