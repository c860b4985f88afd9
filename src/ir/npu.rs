//! Target-side descriptor IR.
//!
//! Three core concepts:
//! 1. **TensorDef** — a tensor registered with the accelerator graph, native
//!    (runtime-produced) or static (constant data, already in target layout)
//! 2. **Param** — a named, typed operator parameter (tensor- or scalar-valued)
//! 3. **OpDescriptor** — one operator: identity + parameters + tensor refs
//!
//! Produced by `lower()`, consumed by the downstream compiler, which
//! serializes and links the descriptor set into the accelerator's compiled
//! program.

use serde::Serialize;

use crate::ir::graph::{DType, TensorKind};

/// Operator package every descriptor belongs to.
pub const OP_PACKAGE_NAME: &str = "npu.builtin";

/// Operator-family identities and parameter names of the convolution protocol.
pub mod ops {
    pub const CONV_2D: &str = "Conv2d";
    pub const DEPTH_WISE_CONV_2D: &str = "DepthWiseConv2d";
    pub const TRANSPOSE_CONV_2D: &str = "TransposeConv2d";

    pub mod param {
        pub const STRIDE: &str = "stride";
        pub const PAD_AMOUNT: &str = "pad_amount";
        pub const DILATION: &str = "dilation";
        pub const OUTPUT_PADDING: &str = "output_padding";
        pub const GROUP: &str = "group";
    }
}

/// Declared shape of the `pad_amount` parameter. Protocol constant: the
/// accelerator always takes a 2x2 before/after-per-axis matrix, whatever
/// form the source padding attribute had.
pub const PAD_AMOUNT_SHAPE: [usize; 2] = [2, 2];

/// Index into [`LoweredGraph::tensors`].
pub type TensorRef = usize;

/// A tensor as registered with the accelerator graph.
#[derive(Debug, Clone, Serialize)]
pub struct TensorDef {
    pub id: TensorRef,
    pub name: String,
    pub dtype: DType,
    pub shape: Vec<usize>,
    pub kind: TensorKind,
}

/// One named operator parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Param {
    Tensor {
        name: &'static str,
        dtype: DType,
        shape: Vec<usize>,
        values: Vec<u32>,
    },
    Scalar {
        name: &'static str,
        dtype: DType,
        value: u32,
    },
}

impl Param {
    pub fn name(&self) -> &'static str {
        match self {
            Param::Tensor { name, .. } | Param::Scalar { name, .. } => name,
        }
    }
}

/// A fully assembled operator, immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct OpDescriptor {
    /// Source node identity; the downstream compiler keys descriptors by it.
    pub name: String,
    pub package: &'static str,
    pub op_type: &'static str,
    pub inputs: Vec<TensorRef>,
    pub outputs: Vec<TensorRef>,
    pub params: Vec<Param>,
}

impl OpDescriptor {
    /// Look a parameter up by name. Insertion order carries no meaning.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name() == name)
    }
}

/// Assembles one [`OpDescriptor`]. Single-shot: build, `finish()`, drop —
/// a builder is never reused across nodes.
#[derive(Debug)]
pub struct OpDescriptorBuilder {
    desc: OpDescriptor,
}

impl OpDescriptorBuilder {
    pub fn new(name: impl Into<String>, op_type: &'static str) -> Self {
        Self {
            desc: OpDescriptor {
                name: name.into(),
                package: OP_PACKAGE_NAME,
                op_type,
                inputs: Vec::new(),
                outputs: Vec::new(),
                params: Vec::new(),
            },
        }
    }

    pub fn inputs(mut self, refs: Vec<TensorRef>) -> Self {
        self.desc.inputs = refs;
        self
    }

    pub fn outputs(mut self, refs: Vec<TensorRef>) -> Self {
        self.desc.outputs = refs;
        self
    }

    pub fn tensor_param(
        mut self,
        name: &'static str,
        dtype: DType,
        shape: Vec<usize>,
        values: Vec<u32>,
    ) -> Self {
        self.desc.params.push(Param::Tensor {
            name,
            dtype,
            shape,
            values,
        });
        self
    }

    pub fn scalar_param(mut self, name: &'static str, dtype: DType, value: u32) -> Self {
        self.desc.params.push(Param::Scalar { name, dtype, value });
        self
    }

    pub fn finish(self) -> OpDescriptor {
        self.desc
    }
}

/// Complete lowered graph: the shared tensor table plus one descriptor per
/// source node, in graph order.
#[derive(Debug, Serialize)]
pub struct LoweredGraph {
    pub tensors: Vec<TensorDef>,
    pub ops: Vec<OpDescriptor>,
}
