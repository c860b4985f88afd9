//! Graph-to-descriptor lowering pass.
//!
//! Walks the source graph in op order and dispatches each node over the
//! closed [`GraphOp`] family set. All nodes share one [`TensorRegistry`] so a
//! tensor used by several operators is registered exactly once. The first
//! error aborts the whole pass; a partially lowered graph is never returned.

pub mod conv2d;

use std::collections::HashMap;

use log::debug;
use ndarray::ArrayD;

use crate::error::LowerError;
use crate::ir::graph::{Graph, GraphOp, Tensor, TensorId, TensorKind};
use crate::ir::npu::{LoweredGraph, TensorDef, TensorRef};

/// Assigns accelerator-graph tensor slots and caches them by source tensor,
/// so repeated definitions of the same tensor yield the same reference.
#[derive(Debug, Default)]
pub struct TensorRegistry {
    defs: Vec<TensorDef>,
    by_source: HashMap<TensorId, TensorRef>,
}

impl TensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a runtime-produced activation tensor.
    pub fn define_native(&mut self, tensor: &Tensor) -> TensorRef {
        self.define(tensor, tensor.shape.clone(), TensorKind::Native)
    }

    /// Register a constant tensor with its materialized (target-layout) data.
    /// If the tensor is already registered the data is dropped and the cached
    /// reference returned.
    pub fn define_static(&mut self, tensor: &Tensor, data: ArrayD<f32>) -> TensorRef {
        let shape = data.shape().to_vec();
        self.define(tensor, shape, TensorKind::Static(data))
    }

    fn define(&mut self, tensor: &Tensor, shape: Vec<usize>, kind: TensorKind) -> TensorRef {
        if let Some(&cached) = self.by_source.get(&tensor.id) {
            return cached;
        }
        let id = self.defs.len();
        self.defs.push(TensorDef {
            id,
            name: tensor.name.clone(),
            dtype: tensor.dtype,
            shape,
            kind,
        });
        self.by_source.insert(tensor.id, id);
        id
    }

    pub fn into_defs(self) -> Vec<TensorDef> {
        self.defs
    }
}

/// Lower every node of `graph` into its operator descriptor.
pub fn lower_graph(graph: &Graph) -> Result<LoweredGraph, LowerError> {
    let mut registry = TensorRegistry::new();
    let mut ops = Vec::with_capacity(graph.ops.len());

    for op in &graph.ops {
        let desc = match op {
            GraphOp::Convolution(node) => conv2d::lower(node, graph, &mut registry)?,
        };
        debug!("lowered `{}` as {}", desc.name, desc.op_type);
        ops.push(desc);
    }

    Ok(LoweredGraph {
        tensors: registry.into_defs(),
        ops,
    })
}
