//! Persistence Tests
//!
//! Round trips through the default architecture slot.

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use netarch::config::EngineConfig;
use netarch::layers::{default_params, LayerKind, LayerParams, SerializedLayer, Shape};
use netarch::state::DefaultArchitectureSlot;
use netarch::store::ArchitectureStore;
use netarch::training::{Hyperparameters, Optimizer};
use netarch::NetArchError;

fn config_in(dir: &TempDir) -> EngineConfig {
    EngineConfig {
        default_slot: dir.path().join("default_architecture.json"),
        ..EngineConfig::default()
    }
}

fn trainable_store(config: &EngineConfig) -> ArchitectureStore {
    let mut store = ArchitectureStore::from_config(config).unwrap();
    store.append(LayerKind::Conv2D).unwrap();
    store.append(LayerKind::BatchNorm).unwrap();
    store.append(LayerKind::MaxPool).unwrap();
    store.append(LayerKind::GlobalAvgPool).unwrap();
    let out = store.append(LayerKind::Dense).unwrap();
    store.set_param(out, "units", 10).unwrap();
    store
}

#[test]
fn test_round_trip_reproduces_architecture() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let original = trainable_store(&config);
    let hyperparameters = Hyperparameters {
        optimizer: Optimizer::Sgd,
        epochs: 3,
        ..Hyperparameters::default()
    };

    let slot = DefaultArchitectureSlot::from_config(&config);
    slot.save_store(&original, Some(&hyperparameters)).unwrap();

    let mut restored = ArchitectureStore::from_config(&config).unwrap();
    let saved_hp = slot.load_into(&mut restored).unwrap();

    assert_eq!(saved_hp, Some(hyperparameters));
    assert_eq!(restored.to_serialized(), original.to_serialized());
    assert_eq!(restored.summary().unwrap(), original.summary().unwrap());
    restored.validate_for_training().unwrap();

    // Ids are fresh after a load
    for (a, b) in original.layers().iter().zip(restored.layers()) {
        assert_ne!(a.id, b.id);
    }
}

#[test]
fn test_saved_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let slot = DefaultArchitectureSlot::from_config(&config);
    slot.save_store(&trainable_store(&config), None).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(slot.path()).unwrap()).unwrap();

    let layers = json["network_architecture"].as_array().unwrap();
    assert_eq!(layers.len(), 5);
    assert_eq!(layers[0]["type"], "Convolution 2D");
    assert_eq!(layers[3]["type"], "Global Average Pooling");
    assert_eq!(layers[4]["params"]["units"], 10);
    assert!(json.get("training_config").is_none());
    assert_eq!(json["checksum"].as_str().unwrap().len(), 64);
}

#[test]
fn test_tampered_slot_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let slot = DefaultArchitectureSlot::from_config(&config);
    slot.save_store(&trainable_store(&config), None).unwrap();

    let content = fs::read_to_string(slot.path()).unwrap();
    fs::write(slot.path(), content.replace("Max Pooling", "Dropout")).unwrap();

    let mut store = ArchitectureStore::from_config(&config).unwrap();
    let err = slot.load_into(&mut store).unwrap_err();
    assert!(matches!(err, NetArchError::SlotCorrupted { .. }));
    assert!(store.is_empty());
}

#[test]
fn test_empty_slot() {
    let dir = tempfile::tempdir().unwrap();
    let slot = DefaultArchitectureSlot::from_config(&config_in(&dir));

    let err = slot.load().unwrap_err();
    assert!(matches!(err, NetArchError::SlotEmpty { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn test_config_file_drives_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("netarch.json");
    fs::write(&path, r#"{"input_shape": [3, 32, 32], "class_count": 100}"#).unwrap();

    let config = EngineConfig::load(&path).unwrap();
    let store = ArchitectureStore::from_config(&config).unwrap();

    assert_eq!(store.input_shape(), &Shape::spatial(3, 32, 32));
    assert_eq!(store.class_count(), 100);
}

#[test]
fn test_slot_with_two_reducers_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let slot = DefaultArchitectureSlot::from_config(&config);

    let layers = vec![
        SerializedLayer::new(LayerKind::Conv2D, default_params(LayerKind::Conv2D)),
        SerializedLayer::new(LayerKind::GlobalAvgPool, LayerParams::new()),
        SerializedLayer::new(LayerKind::Flatten, LayerParams::new()),
        SerializedLayer::new(LayerKind::Dense, LayerParams::new().with("units", 10)),
    ];
    slot.save(&layers, None).unwrap();

    let mut store = trainable_store(&config);
    let before = store.to_serialized();

    let err = slot.load_into(&mut store).unwrap_err();
    assert!(matches!(err, NetArchError::Structural { .. }));
    assert_eq!(store.to_serialized(), before);
    store.validate_for_training().unwrap();
}
