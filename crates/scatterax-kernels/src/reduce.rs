//! Reduction modes and operator options

use crate::error::{KernelError, KernelResult};
use std::fmt;
use std::str::FromStr;

/// How a scattered value combines with the value already at its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reduce {
    /// Overwrite; with duplicate targets the last writer in row-major order wins
    #[default]
    Assign,
    /// Accumulate by addition
    Add,
    /// Accumulate by multiplication
    Mul,
}

impl Reduce {
    /// Canonical name
    pub fn as_str(self) -> &'static str {
        match self {
            Reduce::Assign => "assign",
            Reduce::Add => "add",
            Reduce::Mul => "mul",
        }
    }
}

impl fmt::Display for Reduce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reduce {
    type Err = KernelError;

    /// ```
    /// use scatterax_kernels::Reduce;
    ///
    /// assert_eq!("multiply".parse::<Reduce>().unwrap(), Reduce::Mul);
    /// assert!("max".parse::<Reduce>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assign" => Ok(Reduce::Assign),
            "add" => Ok(Reduce::Add),
            "mul" | "multiply" => Ok(Reduce::Mul),
            other => Err(KernelError::UnknownReduce(other.to_string())),
        }
    }
}

/// Options for `put_along_axis`
///
/// Defaults: `reduce = Assign`, `include_self = true`, `broadcast = true`.
///
/// ```
/// use scatterax_kernels::{PutAlongAxisOptions, Reduce};
///
/// let opts = PutAlongAxisOptions::new()
///     .with_reduce(Reduce::Add)
///     .with_include_self(false);
/// assert!(opts.validate("put_along_axis").is_ok());
///
/// let bad = PutAlongAxisOptions::new().with_include_self(false);
/// assert!(bad.validate("put_along_axis").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutAlongAxisOptions {
    /// Reduction mode
    pub reduce: Reduce,
    /// Whether the original input value participates in the reduction
    pub include_self: bool,
    /// Whether index and values are broadcast against the input
    pub broadcast: bool,
}

impl Default for PutAlongAxisOptions {
    fn default() -> Self {
        Self {
            reduce: Reduce::Assign,
            include_self: true,
            broadcast: true,
        }
    }
}

impl PutAlongAxisOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reduction mode
    pub fn with_reduce(mut self, reduce: Reduce) -> Self {
        self.reduce = reduce;
        self
    }

    /// Parse and set the reduction mode from its name
    pub fn with_reduce_str(mut self, reduce: &str) -> KernelResult<Self> {
        self.reduce = reduce.parse()?;
        Ok(self)
    }

    /// Set include_self
    pub fn with_include_self(mut self, include_self: bool) -> Self {
        self.include_self = include_self;
        self
    }

    /// Set broadcasting
    pub fn with_broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = broadcast;
        self
    }

    /// Reject option combinations the operator does not support
    pub fn validate(&self, operation: &str) -> KernelResult<()> {
        if !self.include_self && self.reduce == Reduce::Assign {
            return Err(KernelError::IncludeSelfWithAssign {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = PutAlongAxisOptions::default();
        assert_eq!(opts.reduce, Reduce::Assign);
        assert!(opts.include_self);
        assert!(opts.broadcast);
    }

    #[test]
    fn test_parse_reduce() {
        assert_eq!("assign".parse::<Reduce>().unwrap(), Reduce::Assign);
        assert_eq!("add".parse::<Reduce>().unwrap(), Reduce::Add);
        assert_eq!("mul".parse::<Reduce>().unwrap(), Reduce::Mul);
        let err = "mean".parse::<Reduce>().unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn test_with_reduce_str() {
        let opts = PutAlongAxisOptions::new().with_reduce_str("multiply").unwrap();
        assert_eq!(opts.reduce, Reduce::Mul);
        assert!(PutAlongAxisOptions::new().with_reduce_str("min").is_err());
    }

    #[test]
    fn test_include_self_false_allowed_for_accumulation() {
        for reduce in [Reduce::Add, Reduce::Mul] {
            let opts = PutAlongAxisOptions::new()
                .with_reduce(reduce)
                .with_include_self(false);
            assert!(opts.validate("op").is_ok());
        }
    }
}
