//! Model persistence for saving and loading trained agents
//!
//! Network weights go through Burn's Record system; the metadata needed to
//! rebuild the network (and to check it against the current encoder) is
//! stored next to it as JSON.

use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::Backend,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{AgentConfig, QNetwork, QNetworkConfig};
use crate::error::PersistenceError;

/// Metadata saved with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Shape of the saved network
    pub network: QNetworkConfig,

    /// Agent hyperparameters used during training
    pub agent_config: AgentConfig,

    /// Number of episodes trained when the snapshot was taken
    pub episodes_trained: usize,

    /// Score that triggered the snapshot
    pub high_score: u32,

    /// Version identifier for compatibility checking
    pub version: String,
}

impl ModelMetadata {
    pub fn new(
        network: QNetworkConfig,
        agent_config: AgentConfig,
        episodes_trained: usize,
        high_score: u32,
    ) -> Self {
        Self {
            network,
            agent_config,
            episodes_trained,
            high_score,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Where the metadata for a model saved at `path` lives: `<path>.meta.json`
pub fn metadata_path(path: &Path) -> PathBuf {
    with_suffix(path, ".meta.json")
}

/// Where the weights for a model saved at `path` live: `<path>.mpk`
pub fn weights_path(path: &Path) -> PathBuf {
    with_suffix(path, ".mpk")
}

/// Append to the file name; `with_extension` would drop a dotted suffix like `.v1`
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Save network weights and metadata
///
/// Creates parent directories if they don't exist. Weights go to
/// `<path>.mpk` and metadata to `<path>.meta.json`, so `snake.v1` and
/// `snake.v2` never share files.
pub fn save_network<B: Backend>(
    network: &QNetwork<B>,
    metadata: &ModelMetadata,
    path: &Path,
) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(network.clone().into_record(), weights_path(path))
        .map_err(|e| PersistenceError::ModelSave(e.to_string()))?;

    let meta_json = serde_json::to_string_pretty(metadata)?;
    std::fs::write(metadata_path(path), meta_json)?;

    Ok(())
}

/// Read the metadata saved alongside a model
pub fn load_metadata(path: &Path) -> Result<ModelMetadata, PersistenceError> {
    let meta_path = metadata_path(path);
    let meta_json =
        std::fs::read_to_string(&meta_path).map_err(|source| PersistenceError::MetadataRead {
            path: meta_path.clone(),
            source,
        })?;
    serde_json::from_str(&meta_json).map_err(|source| PersistenceError::MetadataParse {
        path: meta_path,
        source,
    })
}

/// Load a trained network and its metadata
///
/// When `expected_input` is given, a model built for a different observation
/// width is rejected before any weights are read.
pub fn load_network<B: Backend>(
    path: &Path,
    expected_input: Option<usize>,
    device: &B::Device,
) -> Result<(QNetwork<B>, ModelMetadata), PersistenceError> {
    let metadata = load_metadata(path)?;

    if let Some(expected) = expected_input {
        if metadata.network.input_size != expected {
            return Err(PersistenceError::IncompatibleModel {
                saved: metadata.network.input_size,
                expected,
            });
        }
    }

    let network = metadata.network.init::<B>(device);
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(weights_path(path), device)
        .map_err(|e| PersistenceError::ModelLoad(format!("{}: {e}", path.display())))?;

    Ok((network.load_record(record), metadata))
}
