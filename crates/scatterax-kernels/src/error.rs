//! Error types for put_along_axis kernels
//!
//! Every failure the kernels can report is a [`KernelError`]. Errors fall
//! into two categories (see [`ErrorCategory`]): malformed arguments detected
//! from shapes and options alone, and runtime failures that depend on the
//! index data or on sizes that only clash once the operator runs.

use scatterax_core::DType;
use std::fmt;
use thiserror::Error;

/// Coarse classification of a kernel error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Argument is malformed (bad rank, axis, option combination, dtype)
    Value,
    /// Argument is well-formed but cannot be applied (index out of range,
    /// size mismatch without broadcasting)
    Runtime,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Value => f.write_str("ValueError"),
            ErrorCategory::Runtime => f.write_str("RuntimeError"),
        }
    }
}

/// Error type for put_along_axis kernel operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// Axis outside `[-rank, rank)`
    #[error("{operation}: axis {axis} is out of range for a tensor of rank {rank}")]
    InvalidAxis {
        operation: String,
        axis: isize,
        rank: usize,
    },

    /// Index rank differs from input rank
    #[error("{operation}: index rank {index_rank} must equal input rank {input_rank}")]
    RankMismatch {
        operation: String,
        input_rank: usize,
        index_rank: usize,
    },

    /// Values rank differs from index rank (broadcast disabled)
    #[error("{operation}: values rank {values_rank} must equal index rank {index_rank} when broadcast is disabled")]
    ValuesRankMismatch {
        operation: String,
        index_rank: usize,
        values_rank: usize,
    },

    /// A shape cannot be broadcast to the required shape
    #[error("{operation}: cannot broadcast {operand} of shape {from:?} to {to:?}")]
    BroadcastMismatch {
        operation: String,
        operand: &'static str,
        from: Vec<usize>,
        to: Vec<usize>,
    },

    /// Index dimension larger than the tensor it addresses
    #[error("{operation}: size does not match at dimension {dim}: index has {index_size}, {operand} has {limit}")]
    SizeMismatch {
        operation: String,
        operand: &'static str,
        dim: usize,
        index_size: usize,
        limit: usize,
    },

    /// Index value outside `[0, size)` along the scatter axis
    #[error("{operation}: index {index} is out of range for axis {axis} with size {size}")]
    IndexOutOfRange {
        operation: String,
        index: i64,
        axis: usize,
        size: usize,
    },

    /// `include_self = false` requested together with `Reduce::Assign`
    #[error("{operation}: include_self=false is not supported when reduce is 'assign'")]
    IncludeSelfWithAssign { operation: String },

    /// Reduce string not recognised
    #[error("unknown reduce mode '{0}', expected one of 'assign', 'add', 'mul', 'multiply'")]
    UnknownReduce(String),

    /// Index tensor with a non-integer element type
    #[error("{operation}: index must be int32 or int64, got {dtype}")]
    NonIntegerIndex { operation: String, dtype: DType },

    /// Operands with incompatible element types
    #[error("{operation}: {operand} has dtype {actual}, expected {expected}")]
    DTypeMismatch {
        operation: String,
        operand: &'static str,
        expected: DType,
        actual: DType,
    },

    /// Host scalar with no value in the base element type
    #[error("{operation}: scalar {value} is not representable as {dtype}")]
    UnrepresentableScalar {
        operation: String,
        value: f64,
        dtype: DType,
    },
}

impl KernelError {
    /// Category of this error
    ///
    /// ```
    /// use scatterax_kernels::{ErrorCategory, KernelError};
    ///
    /// let err = KernelError::UnknownReduce("max".into());
    /// assert_eq!(err.category(), ErrorCategory::Value);
    /// ```
    pub fn category(&self) -> ErrorCategory {
        match self {
            KernelError::SizeMismatch { .. } | KernelError::IndexOutOfRange { .. } => {
                ErrorCategory::Runtime
            }
            KernelError::InvalidAxis { .. }
            | KernelError::RankMismatch { .. }
            | KernelError::ValuesRankMismatch { .. }
            | KernelError::BroadcastMismatch { .. }
            | KernelError::IncludeSelfWithAssign { .. }
            | KernelError::UnknownReduce(_)
            | KernelError::NonIntegerIndex { .. }
            | KernelError::DTypeMismatch { .. }
            | KernelError::UnrepresentableScalar { .. } => ErrorCategory::Value,
        }
    }

    /// Shorthand for `category() == ErrorCategory::Value`
    pub fn is_value_error(&self) -> bool {
        self.category() == ErrorCategory::Value
    }

    /// Shorthand for `category() == ErrorCategory::Runtime`
    pub fn is_runtime_error(&self) -> bool {
        self.category() == ErrorCategory::Runtime
    }
}

/// Result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

/// Helper to create an invalid-axis error
pub fn invalid_axis(operation: &str, axis: isize, rank: usize) -> KernelError {
    KernelError::InvalidAxis {
        operation: operation.to_string(),
        axis,
        rank,
    }
}

/// Helper to create a size-mismatch error
pub fn size_mismatch(
    operation: &str,
    operand: &'static str,
    dim: usize,
    index_size: usize,
    limit: usize,
) -> KernelError {
    KernelError::SizeMismatch {
        operation: operation.to_string(),
        operand,
        dim,
        index_size,
        limit,
    }
}
