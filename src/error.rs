//! Lowering failures.
//!
//! Every failure is fatal for the whole graph: a malformed descriptor would
//! silently corrupt the compiled program, so there is no partial output and
//! nothing to retry. Each variant names the failing node and the offending
//! shape or attribute so the caller can locate it in the source graph.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LowerError {
    /// Convolution inputs must be rank 4; lower-rank convolutions are
    /// canonicalized to rank 4 before they reach the lowering pass.
    #[error("node `{node}`: expected rank-4 input tensor, got rank {rank}")]
    InputRank { node: String, rank: usize },

    #[error("node `{node}`: expected rank-4 weight tensor, got shape {shape:?}")]
    WeightRank { node: String, shape: Vec<usize> },

    #[error("node `{node}`: padding must have 1 or 2 entries, got {len}")]
    PaddingLength { node: String, len: usize },

    #[error(
        "node `{node}`: groups ({groups}) does not evenly divide output channels ({out_channels})"
    )]
    GroupCount {
        node: String,
        groups: u32,
        out_channels: usize,
    },

    /// A weight or bias operand had no constant data attached.
    #[error("node `{node}`: tensor `{tensor}` has no constant data")]
    MissingConstant { node: String, tensor: String },
}
