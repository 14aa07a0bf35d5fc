//! Error handling for netarch
//!
//! Every failure the core detects is returned synchronously. Collaborator
//! failures (training service, default slot) are surfaced as-is, never
//! retried.

use std::path::PathBuf;

use thiserror::Error;

use crate::inference::ShapeError;
use crate::layers::{LayerId, Shape};

/// Result type alias for netarch operations
pub type Result<T> = std::result::Result<T, NetArchError>;

/// Main error type for netarch operations
#[derive(Error, Debug)]
pub enum NetArchError {
    // Ordering Errors
    #[error("Layer cannot be placed here: {reason}")]
    Structural { reason: String },

    #[error("Architecture cannot be trained: {reason}")]
    SubmissionValidation { reason: String },

    // Inference Errors
    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    // Store Errors
    #[error("Layer not found: {id}")]
    LayerNotFound { id: LayerId },

    #[error("Layer index {index} out of range (architecture has {len} layers)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid input shape {shape}: expected rank 1 or 3 with positive dimensions")]
    InvalidInputShape { shape: Shape },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Collaborator Errors
    #[error("{service} failed: {message}")]
    ExternalService { service: String, message: String },

    #[error("No default architecture saved at {path}")]
    SlotEmpty { path: PathBuf },

    #[error("Default architecture at {path} is corrupted: {reason}")]
    SlotCorrupted { path: PathBuf, reason: String },

    // File Errors
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NetArchError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            NetArchError::Structural { .. } => "STRUCTURAL_ERROR",
            NetArchError::SubmissionValidation { .. } => "SUBMISSION_VALIDATION_ERROR",
            NetArchError::Shape(_) => "SHAPE_ERROR",
            NetArchError::LayerNotFound { .. } => "LAYER_NOT_FOUND",
            NetArchError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            NetArchError::InvalidInputShape { .. } => "INVALID_INPUT_SHAPE",
            NetArchError::InvalidConfig { .. } => "INVALID_CONFIG",
            NetArchError::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            NetArchError::SlotEmpty { .. } => "SLOT_EMPTY",
            NetArchError::SlotCorrupted { .. } => "SLOT_CORRUPTED",
            NetArchError::FileReadError { .. } => "FILE_READ_ERROR",
            NetArchError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            NetArchError::Io(_) => "IO_ERROR",
            NetArchError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether the user can fix this by editing the architecture
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NetArchError::Structural { .. }
                | NetArchError::SubmissionValidation { .. }
                | NetArchError::Shape(_)
                | NetArchError::LayerNotFound { .. }
                | NetArchError::IndexOutOfRange { .. }
                | NetArchError::SlotEmpty { .. }
        )
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            NetArchError::Structural { .. } => {
                Some("Place spatial layers before the first Fully Connected layer.")
            }
            NetArchError::SubmissionValidation { .. } => {
                Some("End the architecture with a Fully Connected layer sized to the class count.")
            }
            NetArchError::Shape(_) => {
                Some("Reduce pooling/stride or kernel size so every dimension stays positive.")
            }
            NetArchError::SlotEmpty { .. } => Some("Save a default architecture first."),
            NetArchError::SlotCorrupted { .. } => {
                Some("Save the default architecture again to overwrite the damaged file.")
            }
            NetArchError::ExternalService { .. } => {
                Some("Check that the training service is running and reachable.")
            }
            _ => None,
        }
    }
}
