//! CLI Command Implementations

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::config::EngineConfig;
use crate::error::{NetArchError, Result};
use crate::layers::{templates, SerializedArchitecture};
use crate::state::DefaultArchitectureSlot;
use crate::store::ArchitectureStore;
use crate::training::{build_request, submit, HttpTrainingService, Hyperparameters, TrainingService};

/// Architecture files hold either a bare layer list or a saved-slot style
/// object with a `network_architecture` field.
#[derive(Deserialize)]
#[serde(untagged)]
enum ArchitectureFile {
    Bare(SerializedArchitecture),
    Wrapped {
        network_architecture: SerializedArchitecture,
    },
}

/// Read an architecture file
pub fn load_architecture(path: &Path) -> Result<SerializedArchitecture> {
    let content = fs::read_to_string(path).map_err(|e| NetArchError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file: ArchitectureFile = serde_json::from_str(&content)?;
    Ok(match file {
        ArchitectureFile::Bare(layers) => layers,
        ArchitectureFile::Wrapped {
            network_architecture,
        } => network_architecture,
    })
}

fn load_store(config: &EngineConfig, path: &Path) -> Result<ArchitectureStore> {
    info!("Loading architecture: {}", path.display());
    let architecture = load_architecture(path)?;
    ArchitectureStore::with_architecture(config.input_shape.clone(), config.class_count, architecture)
}

/// List the layer catalog.
pub fn catalog() -> Result<()> {
    for template in templates() {
        println!("{:<24} {}", template.kind.label(), template.description);
        if !template.defaults.is_empty() {
            println!("{:<24} defaults: {}", "", template.defaults);
        }
    }
    Ok(())
}

/// Print shapes and parameter counts for every layer.
pub fn summary(config: &EngineConfig, path: &Path) -> Result<()> {
    let store = load_store(config, path)?;
    print_summary(&store)
}

fn print_summary(store: &ArchitectureStore) -> Result<()> {
    println!("Input: {}", store.input_shape());

    let summary = store.summary()?;
    for (i, (layer, dims)) in store.layers().iter().zip(&summary.dimensions).enumerate() {
        println!(
            "{:>3}  {:<24} {:<16} {:<16} {:>12}",
            i + 1,
            layer.kind.label(),
            dims.input_shape.to_string(),
            dims.output_shape.to_string(),
            dims.param_count
        );
        println!("     {}", dims.param_breakdown);
    }

    println!("Output: {}", summary.output_shape);
    println!("Total parameters: {}", summary.total_params);
    Ok(())
}

/// Check an architecture the way the training service would be guarded.
pub fn validate(config: &EngineConfig, path: &Path) -> Result<()> {
    let store = load_store(config, path)?;
    store.validate_for_training()?;

    println!(
        "Architecture is valid: {} layers, {} parameters",
        store.len(),
        store.total_params().unwrap_or(0)
    );
    Ok(())
}

/// Save an architecture to the default slot.
pub fn set_default(config: &EngineConfig, path: &Path, hyperparameters: &Hyperparameters) -> Result<()> {
    let store = load_store(config, path)?;
    if let Err(err) = store.validate_for_training() {
        warn!("Saving an architecture that cannot be trained yet: {}", err);
    }

    let slot = DefaultArchitectureSlot::from_config(config);
    slot.save_store(&store, Some(hyperparameters))?;

    println!("Default architecture saved: {}", slot.path().display());
    Ok(())
}

/// Print the default slot's contents.
pub fn show_default(config: &EngineConfig) -> Result<()> {
    let slot = DefaultArchitectureSlot::from_config(config);
    let mut store = ArchitectureStore::from_config(config)?;
    let hyperparameters = slot.load_into(&mut store)?;

    println!("Default architecture: {}", slot.path().display());
    if let Some(hp) = hyperparameters {
        println!(
            "Training config: {} lr={} epochs={} batch={} augmentation={}",
            hp.optimizer, hp.learning_rate, hp.epochs, hp.batch_size, hp.augmentation.enabled
        );
    }
    print_summary(&store)
}

/// Submit an architecture for training and print per-epoch results.
pub fn train(
    config: &EngineConfig,
    path: Option<&Path>,
    hyperparameters: &Hyperparameters,
    dry_run: bool,
) -> Result<()> {
    let store = match path {
        Some(path) => load_store(config, path)?,
        None => {
            let slot = DefaultArchitectureSlot::from_config(config);
            info!("Using default architecture: {}", slot.path().display());
            let mut store = ArchitectureStore::from_config(config)?;
            slot.load_into(&mut store)?;
            store
        }
    };

    if dry_run {
        let request = build_request(&store, hyperparameters)?;
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let service = HttpTrainingService::from_config(config);
    let response = submit(&store, hyperparameters, &service)?;

    println!("{:>5} {:>10} {:>10} {:>10} {:>10}", "epoch", "train_acc", "test_acc", "train_loss", "test_loss");
    for epoch in &response.results {
        println!(
            "{:>5} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            epoch.epoch, epoch.train_accuracy, epoch.test_accuracy, epoch.train_loss, epoch.test_loss
        );
    }
    Ok(())
}

/// Print the training service's run history.
pub fn history(config: &EngineConfig) -> Result<()> {
    let service = HttpTrainingService::from_config(config);
    let runs = service.history()?;

    if runs.is_empty() {
        println!("No training runs recorded");
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&runs)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerKind;

    #[test]
    fn test_load_bare_and_wrapped_files() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("bare.json");
        let wrapped = dir.path().join("wrapped.json");
        fs::write(&bare, r#"[{"type": "Flatten"}, {"type": "Fully Connected", "params": {"units": 10}}]"#)
            .unwrap();
        fs::write(
            &wrapped,
            r#"{"network_architecture": [{"type": "Flatten"}], "training_config": null}"#,
        )
        .unwrap();

        let layers = load_architecture(&bare).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].kind, LayerKind::Dense);

        let layers = load_architecture(&wrapped).unwrap();
        assert_eq!(layers.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_architecture(Path::new("/nonexistent/arch.json")).unwrap_err();
        assert!(matches!(err, NetArchError::FileReadError { .. }));
    }
}
