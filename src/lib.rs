//! Framework graph to NPU operator-descriptor compiler.
//!
//! Takes a framework-agnostic tensor graph ([`ir::graph::Graph`]) and lowers
//! each node into the accelerator's operator protocol: a named op descriptor
//! with typed parameters and references into a shared tensor table
//! ([`ir::npu::LoweredGraph`]). The descriptor set is what a downstream
//! compiler serializes and links into the accelerator's compiled program;
//! no numeric work happens here.

pub mod error;
pub mod ir;
pub mod lower;

pub use error::LowerError;
pub use lower::lower_graph;
