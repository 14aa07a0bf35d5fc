//! Persistence
//!
//! The default architecture slot: one saved architecture, optionally with
//! the hyperparameters it was trained with.

pub mod slot;

pub use slot::{DefaultArchitecture, DefaultArchitectureSlot};
