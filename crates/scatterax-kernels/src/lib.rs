//! # scatterax-kernels
//!
//! Forward kernels for the `put_along_axis` scatter operator.
//!
//! **Key Features:**
//! - **Argument preparation** - axis normalisation, index/value broadcasting
//!   and validation, all before any write
//! - **Reduce modes** - `assign`, `add` and `mul`, with or without the input
//!   value participating (`include_self`)
//! - **In-place variant** - [`put_along_axis_`] leaves the input untouched on error
//! - **Typed errors** - [`KernelError`] with a value/runtime [`ErrorCategory`]
//! - **Reference oracle** - explicit-loop implementations in [`reference`]
//!
//! ## Quick Start
//!
//! ```rust
//! use scatterax_core::DenseND;
//! use scatterax_kernels::{put_along_axis, PutAlongAxisOptions, PutValues, Reduce};
//!
//! let x = DenseND::<f64>::zeros(&[3, 5]);
//! let index = DenseND::from_vec(vec![0_i64, 1, 2, 0], &[1, 4]).unwrap();
//! let values = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 4]).unwrap();
//!
//! let opts = PutAlongAxisOptions::new().with_reduce(Reduce::Add);
//! let out = put_along_axis(&x, &index, PutValues::Tensor(&values), 0, &opts).unwrap();
//! assert_eq!(out[&[2, 2]], 3.0);
//! ```
//!
//! ## Broadcasting
//!
//! With `broadcast = true` (the default) an index whose every dimension fits
//! inside the input is broadcast to the input's shape, except along the
//! scatter axis, and values are broadcast to the index. With
//! `broadcast = false` values must have the index's rank and are read at the
//! index positions.

#![deny(warnings)]

pub mod error;
pub mod put_along_axis;
pub mod reduce;
pub mod reference;

pub use error::{ErrorCategory, KernelError, KernelResult};
pub use put_along_axis::{
    normalize_axis, prepare_put_along_axis, put_along_axis, put_along_axis_, PutAlongAxisExt,
    PutAlongAxisPlan, PutValues, ValueSource,
};
pub use reduce::{PutAlongAxisOptions, Reduce};
