//! Convolution-family lowering.
//!
//! A single generic convolution node covers three physical operators on the
//! accelerator: standard, depthwise, and transposed convolution. The variant
//! is decided purely from the weight shape and attributes, the weight is
//! re-laid-out into the accelerator's `(H, W, Cin, Cout)` order, and the
//! attributes are re-encoded into the per-variant parameter schema.

use log::{debug, trace};
use ndarray::ArrayD;

use crate::error::LowerError;
use crate::ir::graph::{ConvNode, DType, Graph};
use crate::ir::npu::{ops, OpDescriptor, OpDescriptorBuilder, TensorRef, PAD_AMOUNT_SHAPE};
use crate::lower::TensorRegistry;

/// Which physical convolution a node lowers to. Decided once per node and
/// never reinterpreted afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvVariant {
    Standard,
    Depthwise,
    Transposed,
}

impl ConvVariant {
    pub fn op_type(self) -> &'static str {
        match self {
            ConvVariant::Standard => ops::CONV_2D,
            ConvVariant::Depthwise => ops::DEPTH_WISE_CONV_2D,
            ConvVariant::Transposed => ops::TRANSPOSE_CONV_2D,
        }
    }

    /// Axis order taking the framework weight layout to `(H, W, Cin, Cout)`:
    /// `(I, O, H, W)` for transposed weights, `(O, I, H, W)` otherwise.
    fn weight_axis_order(self) -> [usize; 4] {
        match self {
            ConvVariant::Transposed => [2, 3, 0, 1],
            _ => [2, 3, 1, 0],
        }
    }
}

/// Classify a node from its raw-layout weight shape, group count, and
/// transposed flag. Input/output tensor shapes are never consulted.
///
/// The transposed flag wins outright; transposed depthwise gets no separate
/// path. Otherwise the weight is `(O, I, H, W)` with the I axis already
/// counting per-group input channels.
pub fn classify(node: &ConvNode, weight_shape: &[usize]) -> Result<ConvVariant, LowerError> {
    if node.transposed {
        return Ok(ConvVariant::Transposed);
    }

    let group_input_channels = weight_shape[1];
    let out_channels = weight_shape[0];
    let groups = node.groups as usize;
    if groups == 0 || out_channels % groups != 0 {
        return Err(LowerError::GroupCount {
            node: node.name.clone(),
            groups: node.groups,
            out_channels,
        });
    }
    let group_output_channels = out_channels / groups;

    // Depthwise: one input channel per group, output channels a multiple of
    // it. groups == 2 is deliberately routed through the standard path:
    // depthwise lowering produced wrong results for negative values on
    // contemporaneous driver revisions.
    // TODO: revisit the `groups > 2` threshold against newer firmware.
    let is_depthwise = group_input_channels == 1
        && group_output_channels % group_input_channels == 0
        && groups > 2;

    if is_depthwise {
        Ok(ConvVariant::Depthwise)
    } else {
        Ok(ConvVariant::Standard)
    }
}

/// Permute a weight tensor into `(H, W, Cin, Cout)` and materialize it
/// contiguously. The permutation itself is a pure view transform; the copy
/// is forced because the consumer requires dense storage in the new order.
fn permute_weight(weight: &ArrayD<f32>, variant: ConvVariant) -> ArrayD<f32> {
    let order = variant.weight_axis_order();
    weight
        .view()
        .permuted_axes(order.to_vec())
        .as_standard_layout()
        .into_owned()
}

/// Expand the source padding attribute into the accelerator's fixed
/// before/after-per-axis form, flattened row-major: `[p]` means the same
/// amount on both axes and both sides, `[h, w]` is symmetric per axis.
fn normalize_padding(node: &ConvNode) -> Result<[u32; 4], LowerError> {
    match node.padding.as_slice() {
        [p] => Ok([*p, *p, *p, *p]),
        [h, w] => Ok([*h, *h, *w, *w]),
        other => Err(LowerError::PaddingLength {
            node: node.name.clone(),
            len: other.len(),
        }),
    }
}

/// Lower one convolution node: classify, re-lay-out the weight, register the
/// operand tensors, and assemble the descriptor.
pub(super) fn lower(
    node: &ConvNode,
    graph: &Graph,
    registry: &mut TensorRegistry,
) -> Result<OpDescriptor, LowerError> {
    let input = graph.tensor(node.input);
    if input.shape.len() != 4 {
        return Err(LowerError::InputRank {
            node: node.name.clone(),
            rank: input.shape.len(),
        });
    }
    let input_ref = registry.define_native(input);

    let weight = graph.tensor(node.weight);
    let weight_data = graph
        .static_data(node.weight)
        .ok_or_else(|| LowerError::MissingConstant {
            node: node.name.clone(),
            tensor: weight.name.clone(),
        })?;
    if weight_data.ndim() != 4 {
        return Err(LowerError::WeightRank {
            node: node.name.clone(),
            shape: weight_data.shape().to_vec(),
        });
    }

    let variant = classify(node, weight_data.shape())?;
    debug!("node `{}`: {:?}", node.name, variant);

    let permuted = permute_weight(weight_data, variant);
    trace!(
        "node `{}`: weight {:?} -> {:?}",
        node.name,
        weight_data.shape(),
        permuted.shape()
    );
    let weight_ref = registry.define_static(weight, permuted);

    let mut inputs = vec![input_ref, weight_ref];
    if let Some(bias_id) = node.bias {
        let bias = graph.tensor(bias_id);
        let bias_data = graph
            .static_data(bias_id)
            .ok_or_else(|| LowerError::MissingConstant {
                node: node.name.clone(),
                tensor: bias.name.clone(),
            })?;
        inputs.push(registry.define_static(bias, bias_data.clone()));
    }

    let output_ref = registry.define_native(graph.tensor(node.output));

    let padding = normalize_padding(node)?;
    // For depthwise, per-group channel counts are implied by the weight
    // shape; the group scalar is only attached for the other variants.
    let groups = match variant {
        ConvVariant::Depthwise => None,
        _ => Some(node.groups),
    };

    Ok(build_descriptor(
        variant,
        node,
        inputs,
        vec![output_ref],
        padding,
        groups,
    ))
}

/// Shared parameter-attachment path for all three variants. Transposed
/// carries `output_padding` in place of `dilation` — never both — and the
/// group scalar goes on only when a count was passed in.
fn build_descriptor(
    variant: ConvVariant,
    node: &ConvNode,
    inputs: Vec<TensorRef>,
    outputs: Vec<TensorRef>,
    padding: [u32; 4],
    groups: Option<u32>,
) -> OpDescriptor {
    let mut builder = OpDescriptorBuilder::new(node.name.as_str(), variant.op_type())
        .inputs(inputs)
        .outputs(outputs)
        .tensor_param(
            ops::param::STRIDE,
            DType::U32,
            vec![node.stride.len()],
            node.stride.clone(),
        )
        .tensor_param(
            ops::param::PAD_AMOUNT,
            DType::U32,
            PAD_AMOUNT_SHAPE.to_vec(),
            padding.to_vec(),
        );

    builder = if variant == ConvVariant::Transposed {
        builder.tensor_param(
            ops::param::OUTPUT_PADDING,
            DType::U32,
            vec![node.output_padding.len()],
            node.output_padding.clone(),
        )
    } else {
        builder.tensor_param(
            ops::param::DILATION,
            DType::U32,
            vec![node.dilation.len()],
            node.dilation.clone(),
        )
    };

    if let Some(groups) = groups {
        builder = builder.scalar_param(ops::param::GROUP, DType::U32, groups);
    }

    builder.finish()
}
