//! Netarch - CNN architecture shape inference and validation
//!
//! Netarch models a convolutional network as an ordered list of layer
//! descriptors and keeps three things consistent as it is edited:
//! - Shape inference: per-layer input/output shapes and parameter counts
//! - Insertion rules: edits that would produce a malformed network are refused
//! - Submission rules: only trainable architectures reach the training service
//!
//! The [`store::ArchitectureStore`] owns the architecture, re-runs inference
//! after every change and notifies subscribers.

pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod layers;
pub mod state;
pub mod store;
pub mod training;
pub mod validation;

pub use error::{NetArchError, Result};
