//! Dense tensor implementation and operations
//!
//! The type lives in [`types`]; operations are grouped by functionality.

// Core type definition
pub mod types;

// Operation modules
mod creation;
mod indexing;
mod shape_ops;

// Supporting modules
pub mod densend_traits;
pub(crate) mod functions;

// Re-export the main type
pub use types::DenseND;

pub use functions::{
    broadcast_shape, ravel_index, row_major_strides, shapes_broadcastable, unravel_index,
};
