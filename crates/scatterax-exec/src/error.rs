//! Errors raised while building or running programs
//!
//! Operator failures stay [`KernelError`]s inside the returned
//! `anyhow::Error`; [`ExecError`] covers what only the execution layer can
//! detect (feeds, variable ids, gradient requests). [`error_category`]
//! classifies either kind.

use crate::program::VarId;
use scatterax_core::DType;
use scatterax_kernels::{ErrorCategory, KernelError};
use thiserror::Error;

/// Execution-layer error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecError {
    /// A declared placeholder was not fed
    #[error("missing feed for placeholder '{name}'")]
    MissingFeed { name: String },

    /// Feed dtype differs from the placeholder dtype
    #[error("feed '{name}' has dtype {actual}, placeholder declares {expected}")]
    FeedDTypeMismatch {
        name: String,
        expected: DType,
        actual: DType,
    },

    /// Feed shape contradicts the placeholder shape
    #[error("feed '{name}' has shape {actual:?}, placeholder declares {expected}")]
    FeedShapeMismatch {
        name: String,
        expected: String,
        actual: Vec<usize>,
    },

    /// Variable id not declared in this program
    #[error("unknown variable {0}")]
    UnknownVar(VarId),

    /// No gradient path between the requested variables
    #[error("cannot differentiate {target} with respect to {input}: {reason}")]
    NoGradient {
        target: VarId,
        input: VarId,
        reason: String,
    },

    /// Gradients requested for a non-float tensor
    #[error("gradients need a float dtype, got {0}")]
    NonFloatGradient(DType),
}

impl ExecError {
    /// Every execution-layer error is a malformed request
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Value
    }
}

/// Category of an error returned by this crate, if it carries one
///
/// ```
/// use scatterax_exec::{error_category, ExecError};
/// use scatterax_kernels::ErrorCategory;
///
/// let err = anyhow::Error::from(ExecError::MissingFeed { name: "X".into() });
/// assert_eq!(error_category(&err), Some(ErrorCategory::Value));
/// ```
pub fn error_category(err: &anyhow::Error) -> Option<ErrorCategory> {
    if let Some(e) = err.downcast_ref::<KernelError>() {
        return Some(e.category());
    }
    err.downcast_ref::<ExecError>().map(ExecError::category)
}

/// Render a declared shape, `-1` standing for an unknown dimension
pub(crate) fn format_declared_shape(shape: &[Option<usize>]) -> String {
    let dims: Vec<String> = shape
        .iter()
        .map(|d| d.map_or_else(|| "-1".to_string(), |n| n.to_string()))
        .collect();
    format!("[{}]", dims.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_error_category_passes_through() {
        let err = anyhow::Error::from(KernelError::IndexOutOfRange {
            operation: "put_along_axis".into(),
            index: 10,
            axis: 0,
            size: 2,
        });
        assert_eq!(error_category(&err), Some(ErrorCategory::Runtime));
    }

    #[test]
    fn test_foreign_error_has_no_category() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(error_category(&err), None);
    }

    #[test]
    fn test_declared_shape_rendering() {
        assert_eq!(format_declared_shape(&[Some(2), None]), "[2, -1]");
        assert_eq!(format_declared_shape(&[]), "[]");
    }
}
