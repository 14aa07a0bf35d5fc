//! Shape Inference Engine
//!
//! Threads a fixed input shape through an ordered layer list and derives
//! each layer's input/output shape and trainable parameter count.

mod engine;
mod error;

pub use engine::{infer, summarize, ArchitectureSummary, LayerDimensions};
pub use error::ShapeError;
