use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::game::GridConfig;
use crate::rl::AgentConfig;

/// Settings of the training run itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Stop after this many episodes; `None` trains until interrupted
    pub max_episodes: Option<usize>,

    /// Where the model is written whenever a new record score is reached
    pub model_path: PathBuf,

    /// Seed for the environment, agent, replay memory and weight init
    pub seed: Option<u64>,

    /// Episodes covered by the rolling statistics
    pub stats_window: usize,

    /// Log a statistics summary every N episodes
    pub log_frequency: usize,

    /// Continue from a previously saved model
    pub resume_from: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            max_episodes: None,
            model_path: PathBuf::from("models/model"),
            seed: None,
            stats_window: 100,
            log_frequency: 100,
            resume_from: None,
        }
    }
}

/// Top-level application configuration, loadable from TOML.
///
/// ```toml
/// [grid]
/// tile_size = 40
/// x_min = 400
/// x_max = 1200
///
/// [agent]
/// learning_rate = 0.001
/// far_danger = true
///
/// [agent.exploration]
/// kind = "linear"
/// start = 80
/// range = 200
///
/// [training]
/// max_episodes = 500
/// model_path = "models/model"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub grid: GridConfig,
    pub agent: AgentConfig,
    pub training: TrainingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.agent.validate()?;

        if self.training.max_episodes == Some(0) {
            return Err(ConfigError::Validation(
                "training.max_episodes must be > 0".into(),
            ));
        }
        if self.training.stats_window == 0 {
            return Err(ConfigError::Validation(
                "training.stats_window must be > 0".into(),
            ));
        }
        if self.training.log_frequency == 0 {
            return Err(ConfigError::Validation(
                "training.log_frequency must be > 0".into(),
            ));
        }
        if self.training.model_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "training.model_path must not be empty".into(),
            ));
        }

        Ok(())
    }
}
