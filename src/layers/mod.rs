//! Layer model
//!
//! Layer kinds, shapes, descriptors and the static catalog they are
//! instantiated from.

mod catalog;
mod descriptor;
mod kind;
mod shape;

pub use catalog::{default_params, instantiate, templates, LayerTemplate};
pub use descriptor::{
    LayerDescriptor, LayerId, LayerParams, ParamValue, SerializedArchitecture, SerializedLayer,
};
pub use kind::LayerKind;
pub use shape::Shape;
