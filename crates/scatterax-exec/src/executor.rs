//! Static-graph executor
//!
//! [`Executor::run`] validates the feed map against the program's
//! placeholders, evaluates every op in program order and returns the
//! fetched variables.

use crate::config::{ExecConfig, Place};
use crate::eager::{self, ValueArg};
use crate::error::{format_declared_shape, ExecError};
use crate::program::{GradWrt, Op, Program, ProgramValue, VarDesc, VarId};
use anyhow::{anyhow, Result};
use scatterax_core::TensorValue;
use std::collections::HashMap;

/// Runs [`Program`]s on a [`Place`]
///
/// # Example
///
/// ```
/// use scatterax_core::{DType, DenseND, TensorValue};
/// use scatterax_exec::{Executor, Place, Program};
/// use scatterax_kernels::PutAlongAxisOptions;
/// use std::collections::HashMap;
///
/// let mut program = Program::new();
/// let x = program.data("X", &[Some(1), Some(3)], DType::F32);
/// let index = program.data("Index", &[Some(1), Some(1)], DType::I64);
/// let out = program
///     .put_along_axis(x, index, 99.0, 0, &PutAlongAxisOptions::default())
///     .unwrap();
///
/// let mut feed = HashMap::new();
/// feed.insert("X".to_string(), TensorValue::from(DenseND::<f32>::zeros(&[1, 3])));
/// feed.insert(
///     "Index".to_string(),
///     TensorValue::from(DenseND::from_vec(vec![0_i64], &[1, 1]).unwrap()),
/// );
///
/// let res = Executor::new(Place::Cpu).run(&program, &feed, &[out]).unwrap();
/// assert_eq!(res[0].to_f64_vec(), vec![99.0, 99.0, 99.0]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Executor {
    config: ExecConfig,
}

impl Executor {
    /// Create an executor for `place` with default settings
    pub fn new(place: Place) -> Self {
        Self::with_config(ExecConfig::new().with_place(place))
    }

    /// Create an executor from a full configuration
    pub fn with_config(config: ExecConfig) -> Self {
        Self { config }
    }

    /// Place this executor runs on
    pub fn place(&self) -> Place {
        self.config.place
    }

    /// Active configuration
    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Run `program` and return the values of `fetch`, in order
    ///
    /// Every placeholder must be fed with a tensor of its declared dtype and
    /// a shape its declared shape accepts. Feeds for names the program does
    /// not declare are ignored.
    pub fn run(
        &self,
        program: &Program,
        feed: &HashMap<String, TensorValue>,
        fetch: &[VarId],
    ) -> Result<Vec<TensorValue>> {
        let span = tracing::debug_span!(
            "executor_run",
            place = %self.config.place,
            ops = program.ops().len(),
            fetch = fetch.len()
        );
        let _enter = span.enter();

        for &id in fetch {
            program.var(id)?;
        }
        for desc in program.placeholders() {
            self.check_feed(desc, feed)?;
        }

        let mut env: Vec<Option<TensorValue>> = vec![None; program.num_vars()];
        for (i, op) in program.ops().iter().enumerate() {
            let value = self.eval(program, op, feed, &env)?;
            if self.config.trace {
                tracing::info!(op = i, kind = op.kind(), shape = ?value.shape(), "op finished");
            } else {
                tracing::debug!(op = i, kind = op.kind(), shape = ?value.shape(), "op finished");
            }
            env[op.output().0] = Some(value);
        }

        fetch
            .iter()
            .map(|&id| {
                env[id.0]
                    .clone()
                    .ok_or_else(|| anyhow!("{} was not computed", id))
            })
            .collect()
    }

    fn check_feed(&self, desc: &VarDesc, feed: &HashMap<String, TensorValue>) -> Result<()> {
        let value = feed.get(&desc.name).ok_or_else(|| ExecError::MissingFeed {
            name: desc.name.clone(),
        })?;
        if value.dtype() != desc.dtype {
            return Err(ExecError::FeedDTypeMismatch {
                name: desc.name.clone(),
                expected: desc.dtype,
                actual: value.dtype(),
            }
            .into());
        }
        if self.config.check_feed_shapes && !desc.accepts_shape(value.shape()) {
            return Err(ExecError::FeedShapeMismatch {
                name: desc.name.clone(),
                expected: format_declared_shape(&desc.shape),
                actual: value.shape().to_vec(),
            }
            .into());
        }
        Ok(())
    }

    fn eval(
        &self,
        program: &Program,
        op: &Op,
        feed: &HashMap<String, TensorValue>,
        env: &[Option<TensorValue>],
    ) -> Result<TensorValue> {
        match op {
            Op::Data { out } => {
                let name = &program.var(*out)?.name;
                feed.get(name)
                    .cloned()
                    .ok_or_else(|| ExecError::MissingFeed { name: name.clone() }.into())
            }
            Op::Constant { value, .. } => Ok(value.clone()),
            Op::PutAlongAxis {
                x,
                index,
                values,
                axis,
                opts,
                ..
            } => {
                let x = lookup(env, *x)?;
                let index = lookup(env, *index)?;
                let values = value_arg(env, values)?;
                eager::put_along_axis(x, index, values, *axis, opts)
            }
            Op::Gradient { forward, wrt, .. } => {
                let Some(Op::PutAlongAxis {
                    x,
                    index,
                    values,
                    axis,
                    opts,
                    ..
                }) = program.ops().get(*forward)
                else {
                    return Err(anyhow!(
                        "gradient op refers to op {} which is not put_along_axis",
                        forward
                    ));
                };
                let x = lookup(env, *x)?;
                let index = lookup(env, *index)?;
                let values = value_arg(env, values)?;
                let grads = eager::put_along_axis_grad(x, index, values, *axis, opts, None)?;
                match wrt {
                    GradWrt::Input => Ok(grads.input),
                    GradWrt::Values => grads
                        .values
                        .ok_or_else(|| anyhow!("scalar values have no gradient")),
                }
            }
        }
    }
}

fn lookup(env: &[Option<TensorValue>], id: VarId) -> Result<&TensorValue> {
    env.get(id.0)
        .and_then(Option::as_ref)
        .ok_or_else(|| anyhow!("{} is used before it is computed", id))
}

fn value_arg<'a>(env: &'a [Option<TensorValue>], values: &ProgramValue) -> Result<ValueArg<'a>> {
    match *values {
        ProgramValue::Var(id) => Ok(ValueArg::Tensor(lookup(env, id)?)),
        ProgramValue::Scalar(s) => Ok(ValueArg::Scalar(s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scatterax_core::{DType, DenseND};
    use scatterax_kernels::{ErrorCategory, KernelError, PutAlongAxisOptions};

    fn feed(entries: Vec<(&str, TensorValue)>) -> HashMap<String, TensorValue> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn simple_program() -> (Program, VarId) {
        let mut p = Program::new();
        let x = p.data("X", &[Some(2), None], DType::F64);
        let index = p.data("Index", &[Some(1), Some(1)], DType::I64);
        let out = p
            .put_along_axis(x, index, 7.0, 1, &PutAlongAxisOptions::default())
            .unwrap();
        (p, out)
    }

    fn index_of(i: i64) -> TensorValue {
        TensorValue::from(DenseND::from_vec(vec![i], &[1, 1]).unwrap())
    }

    #[test]
    fn test_run_with_dynamic_dimension() {
        let (p, out) = simple_program();
        let f = feed(vec![
            ("X", TensorValue::from(DenseND::<f64>::zeros(&[2, 4]))),
            ("Index", index_of(3)),
            ("Unused", TensorValue::from(DenseND::<f32>::ones(&[1]))),
        ]);
        let res = Executor::new(Place::Cpu).run(&p, &f, &[out]).unwrap();
        assert_eq!(
            res[0].to_f64_vec(),
            vec![0.0, 0.0, 0.0, 7.0, 0.0, 0.0, 0.0, 7.0]
        );
    }

    #[test]
    fn test_missing_feed() {
        let (p, out) = simple_program();
        let f = feed(vec![("X", TensorValue::from(DenseND::<f64>::zeros(&[2, 4])))]);
        let err = Executor::default().run(&p, &f, &[out]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExecError>(),
            Some(&ExecError::MissingFeed {
                name: "Index".into()
            })
        );
    }

    #[test]
    fn test_feed_dtype_and_shape_checked() {
        let (p, out) = simple_program();
        let f = feed(vec![
            ("X", TensorValue::from(DenseND::<f32>::zeros(&[2, 4]))),
            ("Index", index_of(0)),
        ]);
        let err = Executor::default().run(&p, &f, &[out]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExecError>(),
            Some(ExecError::FeedDTypeMismatch { .. })
        ));

        let f = feed(vec![
            ("X", TensorValue::from(DenseND::<f64>::zeros(&[3, 4]))),
            ("Index", index_of(0)),
        ]);
        let err = Executor::default().run(&p, &f, &[out]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExecError>(),
            Some(ExecError::FeedShapeMismatch { .. })
        ));

        // Unchecked shapes fall through to the kernel
        let lenient = Executor::with_config(ExecConfig::new().with_check_feed_shapes(false));
        let res = lenient.run(&p, &f, &[out]).unwrap();
        assert_eq!(res[0].shape(), &[3, 4]);
    }

    #[test]
    fn test_runtime_error_from_kernel() {
        let (p, out) = simple_program();
        let f = feed(vec![
            ("X", TensorValue::from(DenseND::<f64>::zeros(&[2, 2]))),
            ("Index", index_of(10)),
        ]);
        let err = Executor::new(Place::Cpu).run(&p, &f, &[out]).unwrap_err();
        let kernel = err.downcast_ref::<KernelError>().unwrap();
        assert_eq!(kernel.category(), ErrorCategory::Runtime);
    }

    #[test]
    fn test_fetch_placeholder_and_unknown_var() {
        let (p, _) = simple_program();
        let x = p.var_by_name("X").unwrap();
        let f = feed(vec![
            ("X", TensorValue::from(DenseND::<f64>::ones(&[2, 1]))),
            ("Index", index_of(0)),
        ]);
        let exe = Executor::new(Place::Cpu);
        let res = exe.run(&p, &f, &[x]).unwrap();
        assert_eq!(res[0].to_f64_vec(), vec![1.0, 1.0]);

        let err = exe.run(&p, &f, &[VarId(99)]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExecError>(),
            Some(&ExecError::UnknownVar(VarId(99)))
        );
    }

    #[test]
    fn test_gradient_ops() {
        let mut p = Program::new();
        let x = p.data("X", &[Some(2), Some(2)], DType::F64);
        let index = p.constant(TensorValue::from(
            DenseND::from_vec(vec![1_i64, 0], &[1, 2]).unwrap(),
        ));
        let v = p.data("V", &[Some(1), Some(2)], DType::F64);
        let y = p
            .put_along_axis(x, index, v, 0, &PutAlongAxisOptions::default())
            .unwrap();
        let grads = p.gradients(y, &[x, v]).unwrap();

        let f = feed(vec![
            ("X", TensorValue::from(DenseND::<f64>::ones(&[2, 2]))),
            (
                "V",
                TensorValue::from(DenseND::from_vec(vec![3.0, 4.0], &[1, 2]).unwrap()),
            ),
        ]);
        let res = Executor::new(Place::Cpu)
            .run(&p, &f, &[y, grads[0], grads[1]])
            .unwrap();
        assert_eq!(res[0].to_f64_vec(), vec![1.0, 4.0, 3.0, 1.0]);
        assert_eq!(res[1].to_f64_vec(), vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(res[2].to_f64_vec(), vec![1.0, 1.0]);
    }
}
