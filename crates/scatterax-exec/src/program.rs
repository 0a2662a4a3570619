//! Static-graph programs
//!
//! A [`Program`] is built first and run later by an
//! [`Executor`](crate::Executor). Building declares variables (placeholders
//! fed at run time, embedded constants, op outputs) and appends ops in
//! execution order. Everything that can be checked from declared shapes and
//! dtypes is checked while building, so a malformed program fails before any
//! data exists.
//!
//! # Example
//!
//! ```
//! use scatterax_core::DType;
//! use scatterax_exec::Program;
//! use scatterax_kernels::PutAlongAxisOptions;
//!
//! let mut program = Program::new();
//! let x = program.data("X", &[Some(2), Some(2)], DType::F32);
//! let index = program.data("Index", &[None, Some(2)], DType::I64);
//! let out = program
//!     .put_along_axis(x, index, 99.0, 0, &PutAlongAxisOptions::default())
//!     .unwrap();
//! assert_eq!(program.var(out).unwrap().dtype, DType::F32);
//! ```

use crate::error::{format_declared_shape, ExecError};
use anyhow::Result;
use scatterax_core::{DType, Rank, TensorValue};
use scatterax_kernels::{normalize_axis, KernelError, PutAlongAxisOptions};
use std::fmt;

const OPERATION: &str = "put_along_axis";

/// Handle to a variable of a [`Program`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var_{}", self.0)
    }
}

/// Declared metadata of a variable
#[derive(Clone, Debug, PartialEq)]
pub struct VarDesc {
    /// Variable name; placeholders are fed by this name
    pub name: String,
    /// Element type
    pub dtype: DType,
    /// Shape with `None` for dimensions only known at run time
    pub shape: Vec<Option<usize>>,
}

impl VarDesc {
    /// Rank of the variable
    pub fn rank(&self) -> Rank {
        self.shape.len()
    }

    /// Whether `shape` is compatible with the declared shape
    pub fn accepts_shape(&self, shape: &[usize]) -> bool {
        self.shape.len() == shape.len()
            && self
                .shape
                .iter()
                .zip(shape)
                .all(|(declared, &actual)| declared.map_or(true, |n| n == actual))
    }
}

/// Values operand of a program op
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgramValue {
    /// Another program variable
    Var(VarId),
    /// Host scalar embedded in the op
    Scalar(f64),
}

impl From<VarId> for ProgramValue {
    fn from(var: VarId) -> Self {
        ProgramValue::Var(var)
    }
}

impl From<f64> for ProgramValue {
    fn from(value: f64) -> Self {
        ProgramValue::Scalar(value)
    }
}

/// Which operand of a put_along_axis op a gradient op differentiates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradWrt {
    /// The base tensor
    Input,
    /// The values tensor
    Values,
}

/// One op of a program
#[derive(Clone, Debug)]
pub enum Op {
    /// Placeholder filled from the feed map
    Data { out: VarId },
    /// Embedded tensor
    Constant { out: VarId, value: TensorValue },
    /// Scatter along an axis
    PutAlongAxis {
        x: VarId,
        index: VarId,
        values: ProgramValue,
        axis: isize,
        opts: PutAlongAxisOptions,
        out: VarId,
    },
    /// d(sum(output of op `forward`)) / d(operand `wrt`)
    Gradient {
        forward: usize,
        wrt: GradWrt,
        out: VarId,
    },
}

impl Op {
    /// Short op type name
    pub fn kind(&self) -> &'static str {
        match self {
            Op::Data { .. } => "data",
            Op::Constant { .. } => "constant",
            Op::PutAlongAxis { .. } => "put_along_axis",
            Op::Gradient { .. } => "put_along_axis_grad",
        }
    }

    /// Variable this op writes
    pub fn output(&self) -> VarId {
        match self {
            Op::Data { out }
            | Op::Constant { out, .. }
            | Op::PutAlongAxis { out, .. }
            | Op::Gradient { out, .. } => *out,
        }
    }
}

/// A static graph of ops over declared variables
#[derive(Clone, Debug, Default)]
pub struct Program {
    vars: Vec<VarDesc>,
    ops: Vec<Op>,
    /// `producers[v]` is the index of the op writing variable `v`
    producers: Vec<usize>,
}

impl Program {
    /// Create an empty program
    pub fn new() -> Self {
        Self::default()
    }

    /// Ops in execution order
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Number of declared variables
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// Metadata of a variable
    pub fn var(&self, id: VarId) -> Result<&VarDesc> {
        self.vars
            .get(id.0)
            .ok_or_else(|| ExecError::UnknownVar(id).into())
    }

    /// Look up a variable by name
    pub fn var_by_name(&self, name: &str) -> Option<VarId> {
        self.vars.iter().position(|v| v.name == name).map(VarId)
    }

    /// Placeholders the executor must find in its feed map
    pub fn placeholders(&self) -> impl Iterator<Item = &VarDesc> + '_ {
        self.ops.iter().filter_map(move |op| match op {
            Op::Data { out } => self.vars.get(out.0),
            _ => None,
        })
    }

    fn push(&mut self, desc: VarDesc, make_op: impl FnOnce(VarId) -> Op) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(desc);
        self.producers.push(self.ops.len());
        self.ops.push(make_op(id));
        id
    }

    /// Declare a placeholder
    ///
    /// `None` dimensions accept any size when fed.
    pub fn data(&mut self, name: &str, shape: &[Option<usize>], dtype: DType) -> VarId {
        let desc = VarDesc {
            name: name.to_string(),
            dtype,
            shape: shape.to_vec(),
        };
        let id = self.push(desc, |out| Op::Data { out });
        tracing::trace!(
            name,
            %dtype,
            shape = %format_declared_shape(shape),
            "declared placeholder"
        );
        id
    }

    /// Embed a constant tensor
    pub fn constant(&mut self, value: TensorValue) -> VarId {
        let desc = VarDesc {
            name: format!("constant_{}", self.vars.len()),
            dtype: value.dtype(),
            shape: value.shape().iter().map(|&d| Some(d)).collect(),
        };
        self.push(desc, |out| Op::Constant { out, value })
    }

    /// Append a put_along_axis op
    ///
    /// Fails with a [`KernelError`] of value category when the declared
    /// ranks, axis, options or dtypes cannot work. Checks that need the
    /// actual data (index range, sizes of dynamic dimensions) run in the
    /// executor.
    pub fn put_along_axis(
        &mut self,
        x: VarId,
        index: VarId,
        values: impl Into<ProgramValue>,
        axis: isize,
        opts: &PutAlongAxisOptions,
    ) -> Result<VarId> {
        let values = values.into();
        let x_desc = self.var(x)?.clone();
        let index_desc = self.var(index)?;

        if index_desc.rank() != x_desc.rank() {
            return Err(KernelError::RankMismatch {
                operation: OPERATION.to_string(),
                input_rank: x_desc.rank(),
                index_rank: index_desc.rank(),
            }
            .into());
        }
        normalize_axis(axis, x_desc.rank())?;
        opts.validate(OPERATION)?;
        if !index_desc.dtype.is_integer() {
            return Err(KernelError::NonIntegerIndex {
                operation: OPERATION.to_string(),
                dtype: index_desc.dtype,
            }
            .into());
        }
        if let ProgramValue::Var(v) = values {
            let v_desc = self.var(v)?;
            if v_desc.dtype != x_desc.dtype {
                return Err(KernelError::DTypeMismatch {
                    operation: OPERATION.to_string(),
                    operand: "values",
                    expected: x_desc.dtype,
                    actual: v_desc.dtype,
                }
                .into());
            }
            if !opts.broadcast && v_desc.rank() != index_desc.rank() {
                return Err(KernelError::ValuesRankMismatch {
                    operation: OPERATION.to_string(),
                    index_rank: index_desc.rank(),
                    values_rank: v_desc.rank(),
                }
                .into());
            }
        }

        let desc = VarDesc {
            name: format!("put_along_axis_{}.out", self.ops.len()),
            ..x_desc
        };
        let opts = *opts;
        Ok(self.push(desc, |out| Op::PutAlongAxis {
            x,
            index,
            values,
            axis,
            opts,
            out,
        }))
    }

    /// Append ops computing `d(sum(target)) / d(input)` for each input
    ///
    /// `target` must be the output of a put_along_axis op and every input
    /// must be its base tensor or its tensor values.
    pub fn gradients(&mut self, target: VarId, inputs: &[VarId]) -> Result<Vec<VarId>> {
        self.var(target)?;
        let forward = self.producers[target.0];
        let (x, values) = match &self.ops[forward] {
            Op::PutAlongAxis { x, values, .. } => (*x, *values),
            other => {
                return Err(ExecError::NoGradient {
                    target,
                    input: inputs.first().copied().unwrap_or(target),
                    reason: format!("{} is produced by a {} op", target, other.kind()),
                }
                .into())
            }
        };
        let dtype = self.var(target)?.dtype;
        if !dtype.is_float() {
            return Err(ExecError::NonFloatGradient(dtype).into());
        }

        let mut grads = Vec::with_capacity(inputs.len());
        for &input in inputs {
            let wrt = if input == x {
                GradWrt::Input
            } else if values == ProgramValue::Var(input) {
                GradWrt::Values
            } else {
                return Err(ExecError::NoGradient {
                    target,
                    input,
                    reason: "not an operand of the producing op".to_string(),
                }
                .into());
            };
            let input_desc = self.var(input)?;
            let desc = VarDesc {
                name: format!("{}@GRAD", input_desc.name),
                dtype: input_desc.dtype,
                shape: input_desc.shape.clone(),
            };
            grads.push(self.push(desc, |out| Op::Gradient { forward, wrt, out }));
        }
        Ok(grads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scatterax_core::DenseND;
    use scatterax_kernels::{ErrorCategory, Reduce};

    fn kernel_error(err: &anyhow::Error) -> &KernelError {
        err.downcast_ref::<KernelError>().unwrap()
    }

    #[test]
    fn test_build_records_ops_in_order() {
        let mut p = Program::new();
        let x = p.data("X", &[Some(1), Some(3)], DType::F32);
        let index = p.data("Index", &[Some(1), Some(1)], DType::I64);
        let value = p.data("Value", &[], DType::F32);
        let out = p
            .put_along_axis(x, index, value, 0, &PutAlongAxisOptions::default())
            .unwrap();

        let kinds: Vec<_> = p.ops().iter().map(Op::kind).collect();
        assert_eq!(kinds, vec!["data", "data", "data", "put_along_axis"]);
        assert_eq!(p.ops()[3].output(), out);
        assert_eq!(p.var(out).unwrap().shape, vec![Some(1), Some(3)]);
        assert_eq!(p.placeholders().count(), 3);
        assert_eq!(p.var_by_name("Index"), Some(index));
    }

    #[test]
    fn test_rank_mismatch_at_build_time() {
        let mut p = Program::new();
        let x = p.data("X", &[Some(3), Some(5)], DType::F64);
        let index = p.data("Index", &[Some(3)], DType::I64);
        let err = p
            .put_along_axis(x, index, 1.0, 0, &PutAlongAxisOptions::default())
            .unwrap_err();
        assert!(matches!(kernel_error(&err), KernelError::RankMismatch { .. }));
        assert_eq!(kernel_error(&err).category(), ErrorCategory::Value);
    }

    #[test]
    fn test_include_self_with_assign_at_build_time() {
        let mut p = Program::new();
        let x = p.data("X", &[Some(3)], DType::F64);
        let index = p.data("Index", &[Some(1)], DType::I32);
        let opts = PutAlongAxisOptions::new().with_include_self(false);
        let err = p.put_along_axis(x, index, 1.0, 0, &opts).unwrap_err();
        assert!(matches!(
            kernel_error(&err),
            KernelError::IncludeSelfWithAssign { .. }
        ));
    }

    #[test]
    fn test_values_rank_checked_without_broadcast() {
        let mut p = Program::new();
        let x = p.data("X", &[Some(3), Some(5)], DType::F64);
        let index = p.data("Index", &[Some(1), Some(4)], DType::I64);
        let v = p.data("V", &[Some(4)], DType::F64);
        let opts = PutAlongAxisOptions::new().with_broadcast(false);
        let err = p.put_along_axis(x, index, v, 0, &opts).unwrap_err();
        assert!(matches!(
            kernel_error(&err),
            KernelError::ValuesRankMismatch { .. }
        ));

        // With broadcasting a lower-rank value is fine
        assert!(p
            .put_along_axis(x, index, v, 0, &PutAlongAxisOptions::default())
            .is_ok());
    }

    #[test]
    fn test_dtype_checks() {
        let mut p = Program::new();
        let x = p.data("X", &[Some(3)], DType::F32);
        let float_index = p.data("Index", &[Some(1)], DType::F32);
        let err = p
            .put_along_axis(x, float_index, 1.0, 0, &PutAlongAxisOptions::default())
            .unwrap_err();
        assert!(matches!(kernel_error(&err), KernelError::NonIntegerIndex { .. }));

        let index = p.data("Index2", &[Some(1)], DType::I64);
        let v = p.constant(TensorValue::from(DenseND::<f64>::ones(&[1])));
        let err = p
            .put_along_axis(x, index, v, 0, &PutAlongAxisOptions::default())
            .unwrap_err();
        assert!(matches!(kernel_error(&err), KernelError::DTypeMismatch { .. }));
    }

    #[test]
    fn test_gradients_resolve_operands() {
        let mut p = Program::new();
        let x = p.data("X", &[Some(2), Some(2)], DType::F64);
        let index = p.data("Index", &[Some(1), Some(2)], DType::I64);
        let v = p.data("V", &[Some(1), Some(2)], DType::F64);
        let opts = PutAlongAxisOptions::new().with_reduce(Reduce::Mul);
        let y = p.put_along_axis(x, index, v, 0, &opts).unwrap();

        let grads = p.gradients(y, &[x, v]).unwrap();
        assert_eq!(p.var(grads[0]).unwrap().name, "X@GRAD");
        assert_eq!(p.var(grads[1]).unwrap().shape, vec![Some(1), Some(2)]);
        assert!(matches!(
            p.ops().last(),
            Some(Op::Gradient {
                wrt: GradWrt::Values,
                ..
            })
        ));

        let err = p.gradients(y, &[index]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExecError>(),
            Some(ExecError::NoGradient { .. })
        ));
        let err = p.gradients(x, &[x]).unwrap_err();
        assert!(err.downcast_ref::<ExecError>().is_some());
    }

    #[test]
    fn test_accepts_shape() {
        let desc = VarDesc {
            name: "X".into(),
            dtype: DType::F32,
            shape: vec![None, Some(3)],
        };
        assert!(desc.accepts_shape(&[7, 3]));
        assert!(!desc.accepts_shape(&[7, 4]));
        assert!(!desc.accepts_shape(&[3]));
    }
}
