//! Source-side graph IR: the framework-agnostic form nodes arrive in.
//!
//! Attribute extraction from the framework's untyped node arguments happens
//! once, at graph construction; everything past this boundary works with
//! typed fields.

use ndarray::ArrayD;
use serde::Serialize;

pub type TensorId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DType {
    F32,
    I32,
    I8,
    U8,
    U32,
}

#[derive(Debug, Clone, Serialize)]
pub enum TensorKind {
    /// Runtime-produced activation
    Native,
    /// Constant weight/bias data, materialized and baked into the compiled graph
    Static(ArrayD<f32>),
}

#[derive(Debug, Clone, Serialize)]
pub struct Tensor {
    pub id: TensorId,
    pub name: String,
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub kind: TensorKind,
}

/// A convolution node, fully typed at the graph boundary.
///
/// The weight tensor is in the framework's native layout: output-channels
/// major `(O, I, H, W)` for standard/grouped convolution, input-channels
/// major `(I, O, H, W)` when `transposed` is set.
#[derive(Debug, Clone)]
pub struct ConvNode {
    pub name: String,
    pub input: TensorId,
    pub weight: TensorId,
    pub bias: Option<TensorId>,
    pub output: TensorId,
    pub stride: Vec<u32>,
    pub padding: Vec<u32>,
    pub dilation: Vec<u32>,
    pub output_padding: Vec<u32>,
    pub groups: u32,
    pub transposed: bool,
}

/// Closed set of operator families the lowering pass handles.
#[derive(Debug, Clone)]
pub enum GraphOp {
    Convolution(ConvNode),
}

#[derive(Debug, Default)]
pub struct Graph {
    pub tensors: Vec<Tensor>,
    pub ops: Vec<GraphOp>,
    pub inputs: Vec<TensorId>,
    pub outputs: Vec<TensorId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tensor(&self, id: TensorId) -> &Tensor {
        &self.tensors[id]
    }

    pub fn add_tensor(
        &mut self,
        name: impl Into<String>,
        shape: Vec<usize>,
        dtype: DType,
        kind: TensorKind,
    ) -> TensorId {
        let id = self.tensors.len();
        self.tensors.push(Tensor {
            id,
            name: name.into(),
            shape,
            dtype,
            kind,
        });
        id
    }

    /// Materialized constant data for a tensor, if it has any.
    pub fn static_data(&self, id: TensorId) -> Option<&ArrayD<f32>> {
        match &self.tensor(id).kind {
            TensorKind::Static(data) => Some(data),
            TensorKind::Native => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn add_tensor_assigns_sequential_ids() {
        let mut graph = Graph::new();
        let a = graph.add_tensor("a", vec![4], DType::F32, TensorKind::Native);
        let b = graph.add_tensor("b", vec![2, 2], DType::F32, TensorKind::Native);
        assert_eq!((a, b), (0, 1));
        assert_eq!(graph.tensor(b).shape, vec![2, 2]);
    }

    #[test]
    fn static_data_only_for_constants() {
        let mut graph = Graph::new();
        let act = graph.add_tensor("act", vec![4], DType::F32, TensorKind::Native);
        let data = ArrayD::zeros(IxDyn(&[2, 2]));
        let w = graph.add_tensor("w", vec![2, 2], DType::F32, TensorKind::Static(data));
        assert!(graph.static_data(act).is_none());
        assert_eq!(graph.static_data(w).unwrap().shape(), &[2, 2]);
    }
}
