//! Submission gate in front of the training service

use log::info;

use super::types::{Hyperparameters, TrainingRequest, TrainingResponse};
use crate::error::Result;
use crate::store::ArchitectureStore;

/// A collaborator that trains architectures
///
/// Implementations report their own failures as
/// [`NetArchError::ExternalService`](crate::NetArchError::ExternalService).
pub trait TrainingService {
    /// Train one architecture and return per-epoch metrics
    fn train(&self, request: &TrainingRequest) -> Result<TrainingResponse>;

    /// Summaries of past training runs
    fn history(&self) -> Result<Vec<serde_json::Value>>;
}

/// Validate the store's architecture and build the request for it
pub fn build_request(
    store: &ArchitectureStore,
    hyperparameters: &Hyperparameters,
) -> Result<TrainingRequest> {
    store.validate_for_training()?;

    Ok(TrainingRequest {
        network_architecture: store.to_serialized(),
        hyperparameters: hyperparameters.clone(),
    })
}

/// Validate, then hand the architecture to `service`
///
/// Nothing is sent if validation fails. Service errors are returned
/// unchanged.
pub fn submit(
    store: &ArchitectureStore,
    hyperparameters: &Hyperparameters,
    service: &dyn TrainingService,
) -> Result<TrainingResponse> {
    let request = build_request(store, hyperparameters)?;

    info!(
        "Submitting {} layers ({} params) for {} epochs with {}",
        request.network_architecture.len(),
        store.total_params().unwrap_or(0),
        hyperparameters.epochs,
        hyperparameters.optimizer
    );

    service.train(&request)
}
