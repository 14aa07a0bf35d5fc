//! Layer kinds
//!
//! The closed set of layer types an architecture can be built from, with the
//! wire labels the front end and the training service exchange.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type of a layer in the architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayerKind {
    /// Standard 2D convolution
    #[serde(rename = "Convolution 2D", alias = "Conv2D", alias = "conv2d")]
    Conv2D,
    /// Pointwise (1x1) convolution
    #[serde(rename = "Convolution 1x1", alias = "Conv1x1", alias = "conv1x1")]
    Conv1x1,
    /// Batch normalization
    #[serde(rename = "Batch Normalization", alias = "BatchNorm", alias = "batchnorm")]
    BatchNorm,
    /// Max pooling
    #[serde(rename = "Max Pooling", alias = "MaxPool", alias = "maxpool")]
    MaxPool,
    /// Global average pooling, collapses the spatial plane to 1x1
    #[serde(rename = "Global Average Pooling", alias = "GlobalAvgPool", alias = "gap")]
    GlobalAvgPool,
    /// Flatten to a feature vector
    #[serde(rename = "Flatten", alias = "flatten")]
    Flatten,
    /// Dropout regularization
    #[serde(rename = "Dropout", alias = "dropout")]
    Dropout,
    /// Fully connected layer
    #[serde(rename = "Fully Connected", alias = "Dense", alias = "dense")]
    Dense,
}

impl LayerKind {
    /// Every kind, in catalog order
    pub const ALL: [LayerKind; 8] = [
        LayerKind::Conv2D,
        LayerKind::Conv1x1,
        LayerKind::BatchNorm,
        LayerKind::MaxPool,
        LayerKind::GlobalAvgPool,
        LayerKind::Flatten,
        LayerKind::Dropout,
        LayerKind::Dense,
    ];

    /// Wire label used in serialized architectures
    pub fn label(&self) -> &'static str {
        match self {
            Self::Conv2D => "Convolution 2D",
            Self::Conv1x1 => "Convolution 1x1",
            Self::BatchNorm => "Batch Normalization",
            Self::MaxPool => "Max Pooling",
            Self::GlobalAvgPool => "Global Average Pooling",
            Self::Flatten => "Flatten",
            Self::Dropout => "Dropout",
            Self::Dense => "Fully Connected",
        }
    }

    /// Collapses spatial structure to rank 1 (`Flatten`, `GlobalAvgPool`)
    pub fn is_reducing(&self) -> bool {
        matches!(self, Self::Flatten | Self::GlobalAvgPool)
    }

    /// Layers whose presence makes a reducing layer meaningful
    pub fn is_feature_extractor(&self) -> bool {
        matches!(self, Self::Conv2D | Self::Conv1x1 | Self::MaxPool)
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for kind in LayerKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.label()));
            let back: LayerKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_aliases() {
        let kind: LayerKind = serde_json::from_str("\"dense\"").unwrap();
        assert_eq!(kind, LayerKind::Dense);
        let kind: LayerKind = serde_json::from_str("\"gap\"").unwrap();
        assert_eq!(kind, LayerKind::GlobalAvgPool);
        assert!(serde_json::from_str::<LayerKind>("\"lstm\"").is_err());
    }

    #[test]
    fn test_serde_uses_wire_label() {
        let json = serde_json::to_string(&LayerKind::Dense).unwrap();
        assert_eq!(json, "\"Fully Connected\"");

        let kind: LayerKind = serde_json::from_str("\"Max Pooling\"").unwrap();
        assert_eq!(kind, LayerKind::MaxPool);

        let kind: LayerKind = serde_json::from_str("\"conv2d\"").unwrap();
        assert_eq!(kind, LayerKind::Conv2D);
    }

    #[test]
    fn test_classification() {
        assert!(LayerKind::Flatten.is_reducing());
        assert!(LayerKind::GlobalAvgPool.is_reducing());
        assert!(!LayerKind::Dense.is_reducing());

        assert!(LayerKind::Conv1x1.is_feature_extractor());
        assert!(!LayerKind::BatchNorm.is_feature_extractor());
    }
}
