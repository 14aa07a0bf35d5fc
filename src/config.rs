//! Engine configuration
//!
//! Settings come from built-in defaults, optionally a JSON file, and finally
//! environment overrides:
//!
//! - `NETARCH_SERVICE_URL`: base URL of the training service
//! - `NETARCH_TIMEOUT_MS`: training request timeout
//! - `NETARCH_DEFAULT_SLOT`: path of the default architecture file
//!
//! # Example
//!
//! ```json
//! {
//!   "input_shape": [3, 32, 32],
//!   "class_count": 10,
//!   "service_url": "http://localhost:8000"
//! }
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NetArchError, Result};
use crate::layers::Shape;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_SLOT_FILE: &str = "default_architecture.json";

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shape of one input sample, e.g. `[1, 28, 28]` for MNIST
    pub input_shape: Shape,
    /// Number of classes; the final Fully Connected layer must match it
    pub class_count: usize,
    /// Base URL of the remote training service
    pub service_url: String,
    /// Timeout for a training request, in milliseconds
    pub timeout_ms: u64,
    /// Where the default architecture is stored
    pub default_slot: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            input_shape: Shape::spatial(1, 28, 28),
            class_count: 10,
            service_url: DEFAULT_SERVICE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            default_slot: PathBuf::from(DEFAULT_SLOT_FILE),
        }
    }
}

impl EngineConfig {
    /// Load a configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| NetArchError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults or `path`, then environment overrides, validated
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let config = config.with_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the environment in production)
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("NETARCH_SERVICE_URL") {
            self.service_url = url;
        }
        if let Some(timeout_ms) = lookup("NETARCH_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.timeout_ms = timeout_ms;
        }
        if let Some(slot) = lookup("NETARCH_DEFAULT_SLOT") {
            self.default_slot = PathBuf::from(slot);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.input_shape.is_valid_input() {
            return Err(NetArchError::InvalidInputShape {
                shape: self.input_shape.clone(),
            });
        }
        if self.class_count == 0 {
            return Err(NetArchError::InvalidConfig {
                reason: "class_count must be at least 1".to_string(),
            });
        }
        if self.service_url.trim().is_empty() {
            return Err(NetArchError::InvalidConfig {
                reason: "service_url must not be empty".to_string(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(NetArchError::InvalidConfig {
                reason: "timeout_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}
