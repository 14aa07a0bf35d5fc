//! In-process training service for tests and offline runs
//!
//! Produces a deterministic learning curve instead of training anything, and
//! keeps the requests it received so callers can inspect them.

use std::sync::Mutex;

use chrono::Utc;
use serde_json::json;

use super::service::TrainingService;
use super::types::{EpochResult, TrainingRequest, TrainingResponse};
use crate::error::{NetArchError, Result};

/// Deterministic stand-in for the remote training service
#[derive(Debug, Default)]
pub struct MockTrainingService {
    failure: Option<String>,
    requests: Mutex<Vec<TrainingRequest>>,
    history: Mutex<Vec<serde_json::Value>>,
}

impl MockTrainingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service whose every call fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<TrainingRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn check_failure(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(NetArchError::ExternalService {
                service: "mock training service".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn curve(epoch: u32) -> EpochResult {
        let progress = 1.0 - 1.0 / (epoch as f64 + 2.0);
        EpochResult {
            epoch,
            train_accuracy: 0.5 + 0.45 * progress,
            test_accuracy: 0.5 + 0.44 * progress,
            train_loss: 1.0 - 0.9 * progress,
            test_loss: 1.0 - 0.88 * progress,
        }
    }
}

impl TrainingService for MockTrainingService {
    fn train(&self, request: &TrainingRequest) -> Result<TrainingResponse> {
        self.check_failure()?;

        let started = Utc::now();
        let results: Vec<EpochResult> = (0..request.hyperparameters.epochs)
            .map(Self::curve)
            .collect();
        let last = results.last();

        let record = json!({
            "timestamp": started.to_rfc3339(),
            "training_end_time": Utc::now().to_rfc3339(),
            "architecture": request.network_architecture,
            "optimizer": request.hyperparameters.optimizer,
            "learning_rate": request.hyperparameters.learning_rate,
            "epochs": request.hyperparameters.epochs,
            "final_train_accuracy": last.map(|r| r.train_accuracy),
            "final_test_accuracy": last.map(|r| r.test_accuracy),
            "training_results": results,
            "augmentation": request.hyperparameters.augmentation,
        });

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let history = match self.history.lock() {
            Ok(mut history) => {
                history.push(record);
                history.clone()
            }
            Err(_) => vec![record],
        };

        Ok(TrainingResponse { results, history })
    }

    fn history(&self) -> Result<Vec<serde_json::Value>> {
        self.check_failure()?;
        Ok(self
            .history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default())
    }
}
