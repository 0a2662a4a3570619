//! # scatterax - scatter values along a tensor axis
//!
//! This is the **meta crate** that re-exports all scatterax components.
//!
//! `put_along_axis(x, index, values, axis)` writes each value into `x` at
//! the position its index entry selects along `axis`, either overwriting
//! (`assign`) or combining (`add`, `mul`) with what is there.
//!
//! ## Quick Start
//!
//! ```
//! use scatterax::prelude::*;
//!
//! let x = DenseND::<f64>::zeros(&[2, 3]);
//! let index = DenseND::from_vec(vec![2_i64], &[1, 1])?;
//! let out = put_along_axis(&x, &index, PutValues::Scalar(99.0), 1, &PutAlongAxisOptions::default())?;
//! assert_eq!(out.to_vec(), vec![0.0, 0.0, 99.0, 0.0, 0.0, 99.0]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Core Tensor Types ([`core`])
//!
//! Dense tensors, dtypes, the dynamically typed `TensorValue` and
//! broadcasting.
//!
//! ### Kernels ([`kernels`])
//!
//! Argument preparation, the forward scatter in every reduce mode, the
//! in-place variant, typed errors and the reference oracle.
//!
//! ```
//! use scatterax::kernels::{put_along_axis, KernelError, PutAlongAxisOptions, PutValues};
//! use scatterax::core::DenseND;
//!
//! let x = DenseND::<f32>::zeros(&[2, 2]);
//! let index = DenseND::from_vec(vec![10_i32], &[1, 1]).unwrap();
//! let err = put_along_axis(&x, &index, PutValues::Scalar(1.0), 0, &PutAlongAxisOptions::default())
//!     .unwrap_err();
//! assert!(err.is_runtime_error());
//! ```
//!
//! ### Automatic Differentiation ([`ad`])
//!
//! Backward rules, an eager computation graph and gradient checking.
//! Available when the `ad` feature is enabled (default).
//!
//! ### Execution ([`exec`])
//!
//! Eager calls on `TensorValue`s and static-graph programs run by an
//! `Executor`. Available when the `exec` feature is enabled (default).
//!
//! ## Features
//!
//! - `ad` (default): gradients
//! - `exec` (default): eager and static-graph execution (implies `ad`)
//! - `full`: everything

#![deny(warnings)]

// Re-export all components
pub use scatterax_core as core;
pub use scatterax_kernels as kernels;

#[cfg(feature = "ad")]
pub use scatterax_ad as ad;

#[cfg(feature = "exec")]
pub use scatterax_exec as exec;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use scatterax::prelude::*;
    //!
    //! let opts = PutAlongAxisOptions::new().with_reduce(Reduce::Add);
    //! let tensor = DenseND::<f64>::zeros(&[3, 5]);
    //! ```

    // Core types
    pub use crate::core::{DType, DenseND, TensorValue};

    // Kernels
    pub use crate::kernels::{
        put_along_axis, put_along_axis_, ErrorCategory, KernelError, PutAlongAxisExt,
        PutAlongAxisOptions, PutValues, Reduce,
    };

    // Gradients
    #[cfg(feature = "ad")]
    pub use crate::ad::{graph::ComputationGraph, put_along_axis_grad, PutAlongAxisVjp, VjpOp};

    // Execution
    #[cfg(feature = "exec")]
    pub use crate::exec::{error_category, Executor, Place, Program, ValueArg};
}
