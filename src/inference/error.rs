//! Shape inference failures

use thiserror::Error;

use crate::layers::{LayerKind, Shape};

/// A layer whose output shape or parameter count cannot be computed
///
/// Every variant names the zero-based position of the offending layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("layer {index} ({kind}) produces {dimension} = {value}, which must be positive")]
    NonPositive {
        index: usize,
        kind: LayerKind,
        dimension: &'static str,
        value: i128,
    },

    #[error("layer {index} ({kind}) expects a [channels, height, width] input, got {shape}")]
    ExpectsSpatial {
        index: usize,
        kind: LayerKind,
        shape: Shape,
    },

    #[error("layer {index} ({kind}): parameter '{param}' {reason}")]
    InvalidParameter {
        index: usize,
        kind: LayerKind,
        param: String,
        reason: String,
    },

    #[error("layer {index} ({kind}): parameter count overflows")]
    Overflow { index: usize, kind: LayerKind },
}

impl ShapeError {
    /// Position of the offending layer
    pub fn index(&self) -> usize {
        match self {
            ShapeError::NonPositive { index, .. }
            | ShapeError::ExpectsSpatial { index, .. }
            | ShapeError::InvalidParameter { index, .. }
            | ShapeError::Overflow { index, .. } => *index,
        }
    }
}
