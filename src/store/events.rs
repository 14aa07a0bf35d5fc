//! Change notifications

use crate::inference::{ArchitectureSummary, ShapeError};
use crate::layers::LayerId;

/// Derived state after the latest mutation
pub type Analysis = std::result::Result<ArchitectureSummary, ShapeError>;

/// A committed mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Inserted { id: LayerId, index: usize },
    ParamsUpdated { id: LayerId },
    Removed { id: LayerId, index: usize },
    Reordered { id: LayerId, from: usize, to: usize },
    /// Whole architecture replaced, e.g. loaded from the default slot
    Replaced { len: usize },
}

/// Delivered to every subscriber after a committed mutation
#[derive(Debug)]
pub struct ArchitectureEvent<'a> {
    pub change: &'a Change,
    pub analysis: &'a Analysis,
}

/// Subscriber callback
pub type Listener = Box<dyn FnMut(&ArchitectureEvent<'_>) + Send>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
