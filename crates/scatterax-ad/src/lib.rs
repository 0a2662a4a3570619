//! # scatterax-ad
//!
//! Automatic differentiation support for scatterax.
//!
//! This crate provides:
//! - The VJP (Vector-Jacobian Product) rule for `put_along_axis` in every
//!   reduce mode, with value gradients mapped back through broadcasting
//! - A tape-based [`graph::ComputationGraph`] for eager gradients
//! - Finite-difference gradient checking in [`gradcheck`]

#![deny(warnings)]

pub mod gradcheck;
pub mod graph;
pub mod vjp;

// Re-exports
pub use vjp::*;
