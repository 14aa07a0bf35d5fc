//! Remote Training Service boundary
//!
//! The core never trains anything. It validates the architecture, builds one
//! request-shaped value and hands it to a [`TrainingService`]; the response
//! is passed back untouched. Retries, timeouts and cancellation belong to the
//! service implementation.

mod http;
mod mock;
mod service;
mod types;

pub use http::HttpTrainingService;
pub use mock::MockTrainingService;
pub use service::{build_request, submit, TrainingService};
pub use types::{
    AugmentationConfig, EpochResult, Hyperparameters, Optimizer, TrainingRequest,
    TrainingResponse,
};
