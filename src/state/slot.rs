//! Default Architecture Slot
//!
//! Stores exactly one serialized architecture in a JSON file:
//!
//! ```json
//! {
//!   "network_architecture": [{"type": "Convolution 2D", "params": {...}}, ...],
//!   "training_config": {"optimizer": "adam", "learning_rate": 0.001, ...},
//!   "saved_at": "2024-05-01T12:00:00Z",
//!   "checksum": "<sha256 of network_architecture>"
//! }
//! ```
//!
//! Files written without `checksum` (or `saved_at`) are still accepted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::EngineConfig;
use crate::error::{NetArchError, Result};
use crate::layers::SerializedArchitecture;
use crate::store::ArchitectureStore;
use crate::training::Hyperparameters;

/// On-disk layout of the slot
#[derive(Debug, Serialize, Deserialize)]
struct SlotFile {
    network_architecture: SerializedArchitecture,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    training_config: Option<Hyperparameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
}

/// Contents of the slot
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultArchitecture {
    pub architecture: SerializedArchitecture,
    pub hyperparameters: Option<Hyperparameters>,
    pub saved_at: Option<DateTime<Utc>>,
}

/// File-backed slot holding the default architecture
#[derive(Debug, Clone)]
pub struct DefaultArchitectureSlot {
    path: PathBuf,
}

impl DefaultArchitectureSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.default_slot.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Overwrite the slot with `architecture`
    pub fn save(
        &self,
        architecture: &SerializedArchitecture,
        hyperparameters: Option<&Hyperparameters>,
    ) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| NetArchError::FileWriteError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let file = SlotFile {
            network_architecture: architecture.clone(),
            training_config: hyperparameters.cloned(),
            saved_at: Some(Utc::now()),
            checksum: Some(checksum(architecture)?),
        };
        let content = serde_json::to_string_pretty(&file)?;

        fs::write(&self.path, content).map_err(|e| NetArchError::FileWriteError {
            path: self.path.clone(),
            source: e,
        })?;

        info!(
            "Saved default architecture ({} layers) to {}",
            architecture.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Save the current architecture of `store`
    pub fn save_store(
        &self,
        store: &ArchitectureStore,
        hyperparameters: Option<&Hyperparameters>,
    ) -> Result<()> {
        self.save(&store.to_serialized(), hyperparameters)
    }

    /// Read the slot, verifying its checksum when present
    pub fn load(&self) -> Result<DefaultArchitecture> {
        if !self.path.exists() {
            return Err(NetArchError::SlotEmpty {
                path: self.path.clone(),
            });
        }

        let content = fs::read_to_string(&self.path).map_err(|e| NetArchError::FileReadError {
            path: self.path.clone(),
            source: e,
        })?;

        let file: SlotFile =
            serde_json::from_str(&content).map_err(|e| NetArchError::SlotCorrupted {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        match &file.checksum {
            Some(expected) => {
                let actual = checksum(&file.network_architecture)?;
                if &actual != expected {
                    return Err(NetArchError::SlotCorrupted {
                        path: self.path.clone(),
                        reason: format!("checksum mismatch (expected {}, got {})", expected, actual),
                    });
                }
            }
            None => warn!(
                "Default architecture at {} has no checksum; loading unverified",
                self.path.display()
            ),
        }

        Ok(DefaultArchitecture {
            architecture: file.network_architecture,
            hyperparameters: file.training_config,
            saved_at: file.saved_at,
        })
    }

    /// Replace the architecture in `store` with the saved one
    ///
    /// Returns the saved hyperparameters, if any. A saved architecture the
    /// store refuses leaves the store unchanged.
    pub fn load_into(&self, store: &mut ArchitectureStore) -> Result<Option<Hyperparameters>> {
        let saved = self.load()?;
        store.replace(saved.architecture)?;
        Ok(saved.hyperparameters)
    }

    /// Delete the slot file; returns whether there was one
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| NetArchError::FileWriteError {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(true)
    }
}

/// SHA-256 of the architecture's compact JSON encoding, hex encoded
fn checksum(architecture: &SerializedArchitecture) -> Result<String> {
    let bytes = serde_json::to_vec(architecture)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}
