//! Architecture Store
//!
//! Owns the ordered layer sequence of one architecture, applies mutation
//! commands atomically and keeps the derived shapes and parameter counts
//! current for subscribers.

mod architecture;
mod events;

pub use architecture::ArchitectureStore;
pub use events::{Analysis, ArchitectureEvent, Change, Listener, SubscriptionId};
