//! # scatterax-exec
//!
//! Execution paths for `put_along_axis`.
//!
//! This crate provides:
//! - [`eager`] - direct calls on dynamically typed [`TensorValue`]s,
//!   including the in-place variant and gradients
//! - [`Program`] - a static graph of placeholders, constants,
//!   put_along_axis ops and gradient ops, checked while it is built
//! - [`Executor`] - runs a program with a feed map and a fetch list
//! - [`tracing_support`] - subscriber setup for the workspace's logs
//!
//! [`TensorValue`]: scatterax_core::TensorValue

#![deny(warnings)]

pub mod config;
pub mod eager;
pub mod error;
pub mod executor;
pub mod program;
pub mod tracing_support;

// Re-exports
pub use config::{ExecConfig, Place};
pub use eager::{EagerGrads, ValueArg};
pub use error::{error_category, ExecError};
pub use executor::Executor;
pub use program::{GradWrt, Op, Program, ProgramValue, VarDesc, VarId};
