use std::path::PathBuf;

/// Errors that can occur when loading or checking configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),

    #[error("feature encoder produces {encoder} values but the network expects {network}")]
    DimensionMismatch { encoder: usize, network: usize },

    #[error("grid has {cells} cells, not enough for a snake of length {max_len} plus food")]
    GridTooSmall { cells: usize, max_len: usize },
}

/// Malformed actions rejected before they reach the environment.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ActionError {
    #[error("action index {0} is out of range (expected 0, 1 or 2)")]
    InvalidIndex(usize),

    #[error("action vector {0:?} is not one-hot over 3 turns")]
    InvalidOneHot(Vec<f32>),
}

/// Errors that can occur while saving or restoring model parameters.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to save model: {0}")]
    ModelSave(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("saved model has input width {saved}, current encoder produces {expected}")]
    IncompatibleModel { saved: usize, expected: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("agent.learning_rate must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: agent.learning_rate must be > 0"
        );
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = ConfigError::DimensionMismatch {
            encoder: 11,
            network: 14,
        };
        assert_eq!(
            err.to_string(),
            "feature encoder produces 11 values but the network expects 14"
        );
    }

    #[test]
    fn test_action_error_display() {
        assert_eq!(
            ActionError::InvalidIndex(5).to_string(),
            "action index 5 is out of range (expected 0, 1 or 2)"
        );
    }

    #[test]
    fn test_persistence_error_display() {
        let err = PersistenceError::ModelSave("disk full".to_string());
        assert_eq!(err.to_string(), "failed to save model: disk full");
    }
}
