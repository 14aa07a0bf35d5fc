//! Submission-time ordering rules

use super::Verdict;
use crate::layers::{LayerDescriptor, LayerKind};

/// Check whether an architecture may be handed to the training service.
///
/// Rejects an empty architecture, a `Conv2D` or `MaxPool` anywhere after the
/// first `Dense`, and any architecture whose last layer is not a `Dense` with
/// exactly `required_class_count` units.
pub fn validate_for_training(layers: &[LayerDescriptor], required_class_count: usize) -> Verdict {
    let Some(last) = layers.last() else {
        return Verdict::reject("Architecture is empty");
    };

    let mut seen_dense = false;
    for (index, layer) in layers.iter().enumerate() {
        match layer.kind {
            LayerKind::Dense => seen_dense = true,
            LayerKind::Conv2D | LayerKind::MaxPool if seen_dense => {
                return Verdict::reject(format!(
                    "{} at position {} comes after a Fully Connected layer",
                    layer.kind,
                    index + 1
                ));
            }
            _ => {}
        }
    }

    if last.kind != LayerKind::Dense {
        return Verdict::reject(format!(
            "Final layer must be a Fully Connected layer with {} units (found {})",
            required_class_count, last.kind
        ));
    }

    match last.params.require_uint("units") {
        Ok(units) if units == required_class_count => Verdict::Accept,
        Ok(units) => Verdict::reject(format!(
            "Final Fully Connected layer has {} units but the class count is {}",
            units, required_class_count
        )),
        Err(reason) => Verdict::reject(format!(
            "Final Fully Connected layer: parameter 'units' {}",
            reason
        )),
    }
}
