//! Wire types exchanged with the training service

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::layers::SerializedArchitecture;

/// Optimizer the service should train with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optimizer {
    #[default]
    Adam,
    Sgd,
}

impl Optimizer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adam => "adam",
            Self::Sgd => "sgd",
        }
    }
}

impl FromStr for Optimizer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adam" => Ok(Self::Adam),
            "sgd" => Ok(Self::Sgd),
            other => Err(format!("unknown optimizer '{}' (expected adam or sgd)", other)),
        }
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data augmentation applied by the service while training
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AugmentationConfig {
    pub enabled: bool,
    /// Maximum rotation in degrees, either direction
    pub rotation: f64,
    /// Maximum extra zoom factor
    pub zoom: f64,
    /// Maximum horizontal shift as a fraction of the width
    pub width_shift: f64,
    /// Maximum vertical shift as a fraction of the height
    pub height_shift: f64,
    pub horizontal_flip: bool,
}

impl AugmentationConfig {
    /// Augmentation switched on with moderate ranges
    pub fn standard() -> Self {
        Self {
            enabled: true,
            rotation: 10.0,
            zoom: 0.1,
            width_shift: 0.1,
            height_shift: 0.1,
            horizontal_flip: false,
        }
    }
}

/// Training settings bundled with an architecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub optimizer: Optimizer,
    pub learning_rate: f64,
    pub epochs: u32,
    pub batch_size: u32,
    #[serde(default)]
    pub augmentation: AugmentationConfig,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            optimizer: Optimizer::Adam,
            learning_rate: 0.001,
            epochs: 5,
            batch_size: 64,
            augmentation: AugmentationConfig::default(),
        }
    }
}

/// Body of `POST /train`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRequest {
    pub network_architecture: SerializedArchitecture,
    #[serde(flatten)]
    pub hyperparameters: Hyperparameters,
}

/// Metrics for one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochResult {
    pub epoch: u32,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub train_loss: f64,
    pub test_loss: f64,
}

/// Response of `POST /train`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResponse {
    pub results: Vec<EpochResult>,
    /// Training-run summaries kept by the service, passed through as-is
    #[serde(default)]
    pub history: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{LayerKind, LayerParams, SerializedLayer};

    #[test]
    fn test_request_wire_format() {
        let request = TrainingRequest {
            network_architecture: vec![SerializedLayer::new(
                LayerKind::Dense,
                LayerParams::new().with("units", 10).with("activation", "softmax"),
            )],
            hyperparameters: Hyperparameters::default(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["optimizer"], "adam");
        assert_eq!(json["epochs"], 5);
        assert_eq!(json["batch_size"], 64);
        assert_eq!(json["network_architecture"][0]["type"], "Fully Connected");
        assert_eq!(json["augmentation"]["enabled"], false);
        assert!(json.get("hyperparameters").is_none());
    }

    #[test]
    fn test_optimizer_parse() {
        assert_eq!("SGD".parse::<Optimizer>(), Ok(Optimizer::Sgd));
        assert!("rmsprop".parse::<Optimizer>().is_err());
    }

    #[test]
    fn test_response_history_is_optional() {
        let response: TrainingResponse = serde_json::from_str(
            r#"{"results": [{"epoch": 0, "train_accuracy": 0.9, "test_accuracy": 0.91,
                             "train_loss": 0.3, "test_loss": 0.28}]}"#,
        )
        .unwrap();
        assert_eq!(response.results.len(), 1);
        assert!(response.history.is_empty());
    }
}
