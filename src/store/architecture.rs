//! The architecture store
//!
//! Every command either commits fully or leaves the store untouched. After a
//! commit the whole sequence is re-inferred (never patched incrementally) and
//! subscribers are notified synchronously.
//!
//! A shape error does not roll back an edit: the user may be halfway through
//! changing a value. It is held in the analysis, delivered with the event and
//! blocks submission until fixed.

use std::fmt;

use log::{debug, info, warn};

use super::events::{Analysis, ArchitectureEvent, Change, Listener, SubscriptionId};
use crate::config::EngineConfig;
use crate::error::{NetArchError, Result};
use crate::inference::{summarize, ArchitectureSummary, LayerDimensions};
use crate::layers::{
    instantiate, LayerDescriptor, LayerId, LayerKind, LayerParams, ParamValue,
    SerializedArchitecture, Shape,
};
use crate::validation::{can_insert, validate_for_training};

/// Ordered layer sequence of one architecture plus its derived state
pub struct ArchitectureStore {
    layers: Vec<LayerDescriptor>,
    input_shape: Shape,
    class_count: usize,
    analysis: Analysis,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl ArchitectureStore {
    /// Create an empty store for a fixed input shape and class count
    pub fn new(input_shape: Shape, class_count: usize) -> Result<Self> {
        if !input_shape.is_valid_input() {
            return Err(NetArchError::InvalidInputShape { shape: input_shape });
        }
        if class_count == 0 {
            return Err(NetArchError::InvalidConfig {
                reason: "class count must be at least 1".to_string(),
            });
        }

        let analysis = summarize(&[], &input_shape);
        Ok(Self {
            layers: Vec::new(),
            input_shape,
            class_count,
            analysis,
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    /// Create an empty store from engine configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(config.input_shape.clone(), config.class_count)
    }

    /// Create a store holding `architecture`, with freshly generated ids
    pub fn with_architecture(
        input_shape: Shape,
        class_count: usize,
        architecture: SerializedArchitecture,
    ) -> Result<Self> {
        let mut store = Self::new(input_shape, class_count)?;
        store.replace(architecture)?;
        Ok(store)
    }

    // === Commands ===

    /// Append a catalog layer of `kind` at the end
    pub fn append(&mut self, kind: LayerKind) -> Result<LayerId> {
        self.insert_at(self.layers.len(), kind)
    }

    /// Insert a catalog layer of `kind` at `index`
    ///
    /// An index past the end appends. Rejected by the insertion rules, the
    /// store is left unchanged and the reason is returned as
    /// [`NetArchError::Structural`].
    pub fn insert_at(&mut self, index: usize, kind: LayerKind) -> Result<LayerId> {
        let index = index.min(self.layers.len());

        if let Err(err) = can_insert(&self.layers, kind, index).into_structural() {
            warn!("Rejected {} at position {}: {}", kind, index, err);
            return Err(err);
        }

        let layer = instantiate(kind);
        let id = layer.id;
        self.layers.insert(index, layer);
        debug!("Inserted {} ({}) at position {}", kind, id, index);

        self.commit(Change::Inserted { id, index });
        Ok(id)
    }

    /// Replace the parameters of layer `id`
    pub fn update_params(&mut self, id: LayerId, params: LayerParams) -> Result<()> {
        let layer = self.get_mut(id)?;
        layer.params = params;
        debug!("Updated params of {} ({})", layer.kind, id);

        self.commit(Change::ParamsUpdated { id });
        Ok(())
    }

    /// Set a single parameter of layer `id`
    pub fn set_param(
        &mut self,
        id: LayerId,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<()> {
        let layer = self.get_mut(id)?;
        layer.params.set(name, value);

        self.commit(Change::ParamsUpdated { id });
        Ok(())
    }

    /// Remove layer `id`, returning it
    pub fn remove(&mut self, id: LayerId) -> Result<LayerDescriptor> {
        let index = self
            .position(id)
            .ok_or(NetArchError::LayerNotFound { id })?;
        let removed = self.layers.remove(index);
        debug!("Removed {} ({}) from position {}", removed.kind, id, index);

        self.commit(Change::Removed { id, index });
        Ok(removed)
    }

    /// Move the layer at `from` to `to`, keeping its id and params
    ///
    /// `to` past the end moves the layer to the end. Moving a layer onto its
    /// own position is a no-op and notifies nobody.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.layers.len();
        if from >= len {
            return Err(NetArchError::IndexOutOfRange { index: from, len });
        }

        let to = to.min(len - 1);
        if from == to {
            return Ok(());
        }

        let layer = self.layers.remove(from);
        let id = layer.id;
        self.layers.insert(to, layer);
        debug!("Moved {} from position {} to {}", id, from, to);

        self.commit(Change::Reordered { id, from, to });
        Ok(())
    }

    /// Replace the whole architecture
    ///
    /// Ids are regenerated. Position rules are not applied since this is a
    /// wholesale load, but a sequence with more than one reducing layer is
    /// refused and the store is left unchanged.
    pub fn replace(&mut self, architecture: SerializedArchitecture) -> Result<()> {
        let reducers: Vec<String> = architecture
            .iter()
            .filter(|layer| layer.kind.is_reducing())
            .map(|layer| layer.kind.to_string())
            .collect();
        if reducers.len() > 1 {
            let err = NetArchError::Structural {
                reason: format!(
                    "Only one Flatten or Global Average Pooling layer is allowed (found {})",
                    reducers.join(", ")
                ),
            };
            warn!("Rejected loaded architecture: {}", err);
            return Err(err);
        }

        self.layers = architecture
            .into_iter()
            .map(|layer| layer.into_descriptor())
            .collect();
        info!("Loaded architecture with {} layers", self.layers.len());

        let len = self.layers.len();
        self.commit(Change::Replaced { len });
        Ok(())
    }

    /// Remove every layer
    pub fn clear(&mut self) {
        self.layers.clear();
        self.commit(Change::Replaced { len: 0 });
    }

    // === Queries ===

    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    pub fn get(&self, id: LayerId) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn input_shape(&self) -> &Shape {
        &self.input_shape
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }

    /// Derived state after the latest mutation
    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    /// Derived state, with a shape error surfaced as [`NetArchError::Shape`]
    pub fn summary(&self) -> Result<&ArchitectureSummary> {
        self.analysis
            .as_ref()
            .map_err(|e| NetArchError::Shape(e.clone()))
    }

    /// Total parameter count, `None` while a shape error is pending
    pub fn total_params(&self) -> Option<u64> {
        self.analysis.as_ref().ok().map(|s| s.total_params)
    }

    /// Derived dimensions of layer `id`
    pub fn dimensions_of(&self, id: LayerId) -> Option<&LayerDimensions> {
        let index = self.position(id)?;
        self.analysis.as_ref().ok()?.dimensions.get(index)
    }

    /// Check the architecture against the submission rules and shape inference
    pub fn validate_for_training(&self) -> Result<()> {
        validate_for_training(&self.layers, self.class_count).into_submission()?;
        self.summary()?;
        Ok(())
    }

    /// Wire form of the current architecture
    pub fn to_serialized(&self) -> SerializedArchitecture {
        self.layers.iter().map(|l| l.to_serialized()).collect()
    }

    // === Subscriptions ===

    /// Register a listener called after every committed mutation
    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn get_mut(&mut self, id: LayerId) -> Result<&mut LayerDescriptor> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(NetArchError::LayerNotFound { id })
    }

    fn commit(&mut self, change: Change) {
        self.analysis = summarize(&self.layers, &self.input_shape);

        match &self.analysis {
            Ok(summary) => debug!(
                "{} layers, output {}, {} params",
                self.layers.len(),
                summary.output_shape,
                summary.total_params
            ),
            Err(err) => warn!("Architecture has a shape error: {}", err),
        }

        let event = ArchitectureEvent {
            change: &change,
            analysis: &self.analysis,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

impl fmt::Debug for ArchitectureStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchitectureStore")
            .field("layers", &self.layers)
            .field("input_shape", &self.input_shape)
            .field("class_count", &self.class_count)
            .field("analysis", &self.analysis)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
