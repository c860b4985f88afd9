pub mod graph;
pub mod npu;

pub use graph::{ConvNode, DType, Graph, GraphOp, Tensor, TensorId, TensorKind};
pub use npu::{LoweredGraph, OpDescriptor, Param, TensorDef, TensorRef};
