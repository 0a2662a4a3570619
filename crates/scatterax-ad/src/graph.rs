//! Tape-based eager differentiation for put_along_axis.
//!
//! Operations applied through a [`ComputationGraph`] run immediately and are
//! recorded, so that gradients of a scalar loss can be computed afterwards
//! with [`ComputationGraph::backward`].
//!
//! # Example
//!
//! ```
//! use scatterax_ad::graph::ComputationGraph;
//! use scatterax_core::DenseND;
//! use scatterax_kernels::PutAlongAxisOptions;
//!
//! let graph = ComputationGraph::<f64>::new();
//!
//! let x = graph.variable(DenseND::zeros(&[2, 3]), true).unwrap();
//! let v = graph.variable(DenseND::from_vec(vec![99.0], &[1]).unwrap(), true).unwrap();
//! let index = DenseND::from_vec(vec![0_i64], &[1, 1]).unwrap();
//!
//! let y = graph.put_along_axis(&x, &index, &v, 1, &PutAlongAxisOptions::default()).unwrap();
//! let loss = graph.sum(&y).unwrap();
//! graph.backward(&loss).unwrap();
//!
//! assert_eq!(graph.gradient(&x).unwrap().to_vec(), vec![0.0, 1.0, 1.0, 0.0, 1.0, 1.0]);
//! assert_eq!(graph.gradient(&v).unwrap().to_vec(), vec![2.0]);
//! ```

use crate::vjp::PutAlongAxisVjp;
use anyhow::{anyhow, Result};
use scatterax_core::{DenseND, FloatElement, IndexElement};
use scatterax_kernels::{PutAlongAxisOptions, PutValues};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Unique identifier for a node in the computation graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Operation type in the computation graph
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Input variable (leaf node)
    Input,
    /// Scatter along an axis; `values` is `None` for a host scalar
    PutAlongAxis {
        input: NodeId,
        values: Option<NodeId>,
    },
    /// Sum of all elements: z = sum(x)
    Sum { input: NodeId },
}

/// Node in the computation graph
struct GraphNode<T> {
    operation: Operation,
    value: DenseND<T>,
    gradient: Option<DenseND<T>>,
    requires_grad: bool,
    parents: Vec<NodeId>,
    vjp: Option<PutAlongAxisVjp<T>>,
}

impl<T: FloatElement> GraphNode<T> {
    fn accumulate_gradient(&mut self, grad: DenseND<T>) -> Result<()> {
        if !self.requires_grad {
            return Ok(());
        }
        self.gradient = Some(match self.gradient.take() {
            Some(current) => {
                if current.shape() != grad.shape() {
                    return Err(anyhow!(
                        "Gradient shape {:?} doesn't match accumulated {:?}",
                        grad.shape(),
                        current.shape()
                    ));
                }
                DenseND::from_array(current.as_array() + grad.as_array())
            }
            None => grad,
        });
        Ok(())
    }
}

/// Variable reference in the computation graph
#[derive(Debug, Clone, Copy)]
pub struct Variable {
    id: NodeId,
}

impl Variable {
    /// Get the node ID
    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// Computation graph for eager differentiation
pub struct ComputationGraph<T> {
    nodes: Mutex<HashMap<NodeId, GraphNode<T>>>,
    next_id: Mutex<usize>,
}

impl<T: FloatElement> Default for ComputationGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatElement> ComputationGraph<T> {
    /// Create a new computation graph
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
        }
    }

    fn lock_nodes(&self) -> Result<MutexGuard<'_, HashMap<NodeId, GraphNode<T>>>> {
        self.nodes
            .lock()
            .map_err(|_| anyhow!("Computation graph lock poisoned"))
    }

    fn allocate_id(&self) -> Result<NodeId> {
        let mut next_id = self
            .next_id
            .lock()
            .map_err(|_| anyhow!("Computation graph lock poisoned"))?;
        let id = NodeId(*next_id);
        *next_id += 1;
        Ok(id)
    }

    /// Number of recorded nodes
    pub fn len(&self) -> usize {
        self.nodes.lock().map(|n| n.len()).unwrap_or(0)
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all nodes and reset the graph
    pub fn clear(&self) -> Result<()> {
        self.lock_nodes()?.clear();
        *self
            .next_id
            .lock()
            .map_err(|_| anyhow!("Computation graph lock poisoned"))? = 0;
        Ok(())
    }

    /// Create a variable (input node)
    pub fn variable(&self, value: DenseND<T>, requires_grad: bool) -> Result<Variable> {
        let id = self.allocate_id()?;
        let node = GraphNode {
            operation: Operation::Input,
            value,
            gradient: None,
            requires_grad,
            parents: vec![],
            vjp: None,
        };
        self.lock_nodes()?.insert(id, node);
        Ok(Variable { id })
    }

    /// Create a constant (non-differentiable input)
    pub fn constant(&self, value: DenseND<T>) -> Result<Variable> {
        self.variable(value, false)
    }

    fn add_node(
        &self,
        operation: Operation,
        value: DenseND<T>,
        parents: Vec<NodeId>,
        vjp: Option<PutAlongAxisVjp<T>>,
    ) -> Result<Variable> {
        let id = self.allocate_id()?;
        let mut nodes = self.lock_nodes()?;
        let requires_grad = parents
            .iter()
            .any(|p| nodes.get(p).is_some_and(|n| n.requires_grad));
        nodes.insert(
            id,
            GraphNode {
                operation,
                value,
                gradient: None,
                requires_grad,
                parents,
                vjp,
            },
        );
        Ok(Variable { id })
    }

    /// Get the value of a variable
    pub fn value(&self, var: &Variable) -> Result<DenseND<T>> {
        let nodes = self.lock_nodes()?;
        nodes
            .get(&var.id)
            .map(|n| n.value.clone())
            .ok_or_else(|| anyhow!("Variable not found in graph"))
    }

    /// Get the gradient of a variable
    pub fn gradient(&self, var: &Variable) -> Result<DenseND<T>> {
        let nodes = self.lock_nodes()?;
        let node = nodes
            .get(&var.id)
            .ok_or_else(|| anyhow!("Variable not found in graph"))?;
        node.gradient
            .clone()
            .ok_or_else(|| anyhow!("No gradient available for this variable"))
    }

    /// Check if a variable has a gradient
    pub fn has_gradient(&self, var: &Variable) -> bool {
        self.lock_nodes()
            .map(|nodes| nodes.get(&var.id).is_some_and(|n| n.gradient.is_some()))
            .unwrap_or(false)
    }

    /// Zero all gradients in the graph
    pub fn zero_grad(&self) -> Result<()> {
        for node in self.lock_nodes()?.values_mut() {
            node.gradient = None;
        }
        Ok(())
    }

    // ===== Operations =====

    /// Scatter the tensor `values` into `input` along `axis`
    pub fn put_along_axis<I: IndexElement>(
        &self,
        input: &Variable,
        index: &DenseND<I>,
        values: &Variable,
        axis: isize,
        opts: &PutAlongAxisOptions,
    ) -> Result<Variable> {
        let input_val = self.value(input)?;
        let values_val = self.value(values)?;
        let (out, vjp) = PutAlongAxisVjp::forward(
            &input_val,
            index,
            PutValues::Tensor(&values_val),
            axis,
            opts,
        )?;
        self.add_node(
            Operation::PutAlongAxis {
                input: input.id,
                values: Some(values.id),
            },
            out,
            vec![input.id, values.id],
            Some(vjp),
        )
    }

    /// Scatter a host scalar into `input` along `axis`
    pub fn put_along_axis_scalar<I: IndexElement>(
        &self,
        input: &Variable,
        index: &DenseND<I>,
        value: T,
        axis: isize,
        opts: &PutAlongAxisOptions,
    ) -> Result<Variable> {
        let input_val = self.value(input)?;
        let (out, vjp) =
            PutAlongAxisVjp::forward(&input_val, index, PutValues::Scalar(value), axis, opts)?;
        self.add_node(
            Operation::PutAlongAxis {
                input: input.id,
                values: None,
            },
            out,
            vec![input.id],
            Some(vjp),
        )
    }

    /// Sum reduction: z = sum(x), a rank-0 tensor
    pub fn sum(&self, input: &Variable) -> Result<Variable> {
        let input_val = self.value(input)?;
        let total = input_val.iter().fold(T::zero(), |acc, &x| acc + x);
        self.add_node(
            Operation::Sum { input: input.id },
            DenseND::scalar(total),
            vec![input.id],
            None,
        )
    }

    // ===== Backward Pass =====

    /// Perform backward pass from the given scalar output node
    pub fn backward(&self, output: &Variable) -> Result<()> {
        let mut nodes = self.lock_nodes()?;

        let output_node = nodes
            .get_mut(&output.id)
            .ok_or_else(|| anyhow!("Output variable not found"))?;
        if output_node.value.len() != 1 {
            return Err(anyhow!(
                "Backward can only be called on scalar outputs, got shape {:?}",
                output_node.value.shape()
            ));
        }
        output_node.gradient = Some(DenseND::from_elem(output_node.value.shape(), T::one()));

        let topo_order = topological_sort(&nodes, output.id)?;
        tracing::debug!(nodes = topo_order.len(), "backward pass");

        for &node_id in topo_order.iter().rev() {
            let node = nodes
                .get(&node_id)
                .ok_or_else(|| anyhow!("Node {} not found", node_id))?;
            if !node.requires_grad {
                continue;
            }
            let Some(grad_output) = node.gradient.clone() else {
                continue;
            };

            let parent_grads = compute_backward(&nodes, node, &grad_output)?;
            for (parent_id, parent_grad) in parent_grads {
                let parent = nodes
                    .get_mut(&parent_id)
                    .ok_or_else(|| anyhow!("Parent node {} not found", parent_id))?;
                parent.accumulate_gradient(parent_grad)?;
            }
        }

        Ok(())
    }
}

/// Nodes reachable from `start`, parents before children
fn topological_sort<T>(
    nodes: &HashMap<NodeId, GraphNode<T>>,
    start: NodeId,
) -> Result<Vec<NodeId>> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![start];

    while let Some(node_id) = stack.pop() {
        if visited.contains(&node_id) {
            continue;
        }
        let node = nodes
            .get(&node_id)
            .ok_or_else(|| anyhow!("Node {} not found during topological sort", node_id))?;

        match node.parents.iter().find(|p| !visited.contains(*p)) {
            Some(&parent) => {
                stack.push(node_id);
                stack.push(parent);
            }
            None => {
                visited.insert(node_id);
                order.push(node_id);
            }
        }
    }

    Ok(order)
}

fn compute_backward<T: FloatElement>(
    nodes: &HashMap<NodeId, GraphNode<T>>,
    node: &GraphNode<T>,
    grad_output: &DenseND<T>,
) -> Result<Vec<(NodeId, DenseND<T>)>> {
    match &node.operation {
        Operation::Input => Ok(vec![]),

        Operation::Sum { input } => {
            let shape = nodes
                .get(input)
                .ok_or_else(|| anyhow!("Node {} not found", input))?
                .value
                .shape_vec();
            let g = grad_output
                .iter()
                .next()
                .copied()
                .ok_or_else(|| anyhow!("Empty gradient for sum"))?;
            Ok(vec![(*input, DenseND::from_elem(&shape, g))])
        }

        Operation::PutAlongAxis { input, values } => {
            let vjp = node
                .vjp
                .as_ref()
                .ok_or_else(|| anyhow!("put_along_axis node without backward context"))?;
            let grads = vjp.backward(grad_output)?;
            let mut out = vec![(*input, grads.input)];
            if let (Some(values), Some(dv)) = (values, grads.values) {
                out.push((*values, dv));
            }
            Ok(out)
        }
    }
}
