//! Insertion-time ordering rules

use log::debug;

use super::Verdict;
use crate::layers::{LayerDescriptor, LayerKind};

/// Check whether a layer of `candidate` kind may be inserted.
///
/// 1. Only one reducing layer (`Flatten` / `GlobalAvgPool`) may exist.
/// 2. A reducing layer needs a `Conv2D`, `Conv1x1` or `MaxPool` somewhere
///    before it can be added, and no `Dense` yet.
/// 3. `Conv2D`, `Conv1x1` and `MaxPool` are refused once any `Dense` exists.
/// 4. `BatchNorm`, `Dropout` and `Dense` are always accepted.
///
/// The rules look at the whole architecture, not at `target_index`.
pub fn can_insert(
    current: &[LayerDescriptor],
    candidate: LayerKind,
    target_index: usize,
) -> Verdict {
    let has_dense = current.iter().any(|l| l.kind == LayerKind::Dense);

    let verdict = match candidate {
        kind if kind.is_reducing() => {
            if let Some(existing) = current.iter().find(|l| l.kind.is_reducing()) {
                Verdict::reject(format!(
                    "Only one Flatten or Global Average Pooling layer is allowed (already have {})",
                    existing.kind
                ))
            } else if !current.iter().any(|l| l.kind.is_feature_extractor()) {
                Verdict::reject(format!(
                    "{} needs a convolution or pooling layer before it",
                    kind
                ))
            } else if has_dense {
                Verdict::reject(format!(
                    "{} must come before any Fully Connected layer",
                    kind
                ))
            } else {
                Verdict::Accept
            }
        }
        kind if kind.is_feature_extractor() && has_dense => Verdict::reject(format!(
            "{} cannot be added after a Fully Connected layer",
            kind
        )),
        _ => Verdict::Accept,
    };

    debug!(
        "can_insert {} at {} into {} layers: {:?}",
        candidate,
        target_index,
        current.len(),
        verdict
    );
    verdict
}
