//! Layer catalog
//!
//! Static table of the layer templates a user can drop into an architecture,
//! with the default parameters each one starts from.

use super::descriptor::{LayerDescriptor, LayerParams};
use super::kind::LayerKind;

/// A catalog entry
#[derive(Debug, Clone)]
pub struct LayerTemplate {
    pub kind: LayerKind,
    pub description: &'static str,
    pub defaults: LayerParams,
}

/// Default parameters for a layer kind
pub fn default_params(kind: LayerKind) -> LayerParams {
    match kind {
        LayerKind::Conv2D => LayerParams::new()
            .with("filters", 32)
            .with("kernelSize", 3)
            .with("stride", 1)
            .with("padding", 1)
            .with("activation", "relu"),
        LayerKind::Conv1x1 => LayerParams::new()
            .with("filters", 32)
            .with("activation", "relu"),
        LayerKind::BatchNorm => LayerParams::new()
            .with("momentum", 0.1)
            .with("epsilon", 1e-5),
        LayerKind::MaxPool => LayerParams::new().with("poolSize", 2).with("stride", 2),
        LayerKind::GlobalAvgPool | LayerKind::Flatten => LayerParams::new(),
        LayerKind::Dropout => LayerParams::new().with("rate", 0.5),
        LayerKind::Dense => LayerParams::new()
            .with("units", 128)
            .with("activation", "relu"),
    }
}

fn description(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Conv2D => "Learns spatial filters over the input feature maps",
        LayerKind::Conv1x1 => "Mixes channels pointwise without touching the spatial plane",
        LayerKind::BatchNorm => "Normalizes activations per channel",
        LayerKind::MaxPool => "Downsamples the spatial plane by the stride",
        LayerKind::GlobalAvgPool => "Averages each channel down to a single value",
        LayerKind::Flatten => "Unrolls feature maps into a feature vector",
        LayerKind::Dropout => "Randomly zeroes activations during training",
        LayerKind::Dense => "Fully connected layer over all incoming features",
    }
}

/// Every template, in catalog order
pub fn templates() -> Vec<LayerTemplate> {
    LayerKind::ALL
        .iter()
        .map(|&kind| LayerTemplate {
            kind,
            description: description(kind),
            defaults: default_params(kind),
        })
        .collect()
}

/// Instantiate a new descriptor of `kind` with catalog defaults and a fresh id
pub fn instantiate(kind: LayerKind) -> LayerDescriptor {
    LayerDescriptor::new(kind, default_params(kind))
}
